//! Bandwagon → National Library archival export.
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod emitter;
pub mod gateway;
pub mod materializer;
pub mod pipeline;
pub mod summary;
pub mod uid;

// Re-export commonly used types for convenience
pub use gateway::{Gateway, GatewayError, GroveClient};
pub use pipeline::ExportPipeline;
pub use summary::RunSummary;
pub use uid::Uid;
