//! Core of tiercache.
//!
//! This crate provides:
//! - The two-tier cache (memory + SQLite) behind [`CacheFacade`]
//! - Unified error types
//! - Configuration structures
//! - Clock, codec and diagnostics seams for embedding and testing

pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;

pub use cache::{CacheFacade, CacheStats, Fingerprint};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{Codec, JsonCodec};
pub use config::{CacheConfig, ConfigError};
pub use diagnostics::{CacheEvent, DiagnosticSink, RecordingSink, TracingSink};
pub use error::Error;
