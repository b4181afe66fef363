//! plm-mr library interface
//!
//! Metadata resolution and correction for a personal music library:
//! classify corrupted tags, clean them, resolve them against public
//! catalogs (with a fingerprint fallback), preview proposals, and apply the
//! approved ones with backups.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{MrError, MrResult};
pub use crate::events::{WorkflowEvent, WorkflowEventBus, EVENT_BUS_CAPACITY};
