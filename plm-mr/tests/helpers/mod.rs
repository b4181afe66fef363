//! Test Helper Utilities
//!
//! Shared fixtures for the plm-mr integration tests. Nothing here touches
//! the network.

#![allow(dead_code)]

pub mod audio_generator;
pub mod db_utils;
pub mod stubs;

pub use audio_generator::{generate_test_wav, AudioConfig};
pub use db_utils::{memory_catalog, seed_songs, song};
pub use stubs::{
    BrokenCatalog, CancellingSource, FailingSource, FailingTagWriter, FixedSource,
    ReadOnlyCatalog, RecordingTagWriter, StubIdentifier,
};
