//! Units of work flowing through the export pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::gateway::{Identity, Post, Publication};

/// A track as emitted by the pagination fetcher, before enrichment.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub year: u16,
    pub track: Post,
}

/// A record with artist, uploader and publication attached.
///
/// Every attachment is either a fetched entity or an explicit placeholder;
/// nothing downstream has to handle a missing one.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub year: u16,
    pub track: Post,
    pub artist: Arc<Post>,
    pub uploader: Arc<Identity>,
    pub publication: Arc<Publication>,
}

/// A fully staged record, ready for materialization and emission.
#[derive(Debug, Clone)]
pub struct StagedRecord {
    pub record: EnrichedRecord,
    pub staging: StagingDescriptor,
}

/// File-placement metadata, derived without any I/O.
#[derive(Debug, Clone)]
pub struct StagingDescriptor {
    /// Local write-once copy of the remote asset, mirroring the URL path.
    pub cache_file: PathBuf,
    /// Where the asset is downloaded from.
    pub asset_url: String,
    /// Per-year directory under the output root.
    pub output_dir: PathBuf,
    /// Archive base filename, shared by the asset copy and the XML document.
    pub base_name: String,
}
