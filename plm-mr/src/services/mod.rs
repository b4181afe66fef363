//! Service modules for metadata resolution
//!
//! Leaves first: similarity and classification are pure; catalog adapters,
//! fingerprinting and cover art talk to the outside world; the orchestrator
//! and the applier compose the rest.

pub mod acoustid_client;
pub mod backup_store;
pub mod catalog_sources;
pub mod correction_applier;
pub mod corruption_classifier;
pub mod cover_art;
pub mod duplicate_detector;
pub mod fallback_identifier;
pub mod file_organizer;
pub mod fingerprinter;
pub mod match_cache;
pub mod metadata_resolver;
pub mod similarity;
pub mod tag_writer;
pub mod workflow_orchestrator;

pub use acoustid_client::{AcoustIDClient, AcoustIDError, AcoustIDMatch};
pub use backup_store::{BackupError, BackupStore};
pub use catalog_sources::{
    build_sources, CatalogError, CatalogSource, RawCandidate, SearchQuery,
};
pub use correction_applier::CorrectionApplier;
pub use cover_art::{CoverArtClient, CoverArtError, CoverArtProvider};
pub use duplicate_detector::{find_similar_songs, SimilarPair};
pub use fallback_identifier::{AcousticFallbackIdentifier, FingerprintMatch, SongIdentifier};
pub use file_organizer::OrganizeError;
pub use fingerprinter::{Fingerprint, FingerprintError, Fingerprinter};
pub use match_cache::MatchCache;
pub use metadata_resolver::{get_best_match, MetadataResolver, SearchReport};
pub use tag_writer::{LoftyTagWriter, TagUpdate, TagWriteError, TagWriter};
pub use workflow_orchestrator::{PipelineHandle, WorkflowOrchestrator};
