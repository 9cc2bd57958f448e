#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

mod common;
pub mod context;
mod error;
pub mod providers;

pub use crate::common::{Key, PeerId, DEFAULT_SENTINEL_SEED};
pub use context::{CancelHandle, Context};
pub use error::{Error, Result};
pub use providers::{Config, ProviderManager};
