//! # PLM Common Library
//!
//! Shared code for the PLM crates:
//! - Error type
//! - Configuration loading and folder resolution
//! - Broadcast event bus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
