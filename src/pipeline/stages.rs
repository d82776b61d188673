//! Enrichment stages.
//!
//! Each stage attaches one entity (or derived descriptor) to a record, with
//! its own policy for missing data:
//! - artist not found: recover with the `(unknown)` placeholder
//! - uploader identity not found: log, then fail the record
//! - publication lookup failure: always recover with a synthesized stand-in
//! - staging derivation: pure, fails only on structurally broken input
//!
//! The artist/identity asymmetry is deliberate and matches the behavior the
//! archive deliveries were produced with; do not unify the policies.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::gateway::models::PostDocument;
use crate::gateway::{Gateway, Identity, Post, Publication};
use crate::uid::Uid;

use super::records::{EnrichedRecord, RawRecord, StagingDescriptor};

/// Display name of the placeholder attached when a track's artist is gone.
pub const UNKNOWN_ARTIST_NAME: &str = "(unknown)";

/// Fixed tokens of the archive filename:
/// Artist_Song_MediaType_MasterType_SampleRate_Bitrate_RevisionNumber,
/// with sample rate and bitrate deliberately left empty.
const BASE_NAME_SUFFIX: [&str; 5] = ["DIS", "Amedia", "", "", "R01"];

fn placeholder_artist(uid: &Uid) -> Post {
    Post {
        uid: uid.to_string(),
        created_by: None,
        document: PostDocument {
            name: UNKNOWN_ARTIST_NAME.to_string(),
            ..PostDocument::default()
        },
    }
}

/// Resolve the track's artist by rearranging the track uid.
///
/// A missing artist (404) yields the placeholder; any other failure fails
/// the record.
pub async fn resolve_artist(gateway: &dyn Gateway, record: &RawRecord) -> Result<Arc<Post>> {
    debug!(track = %record.track.document.name, "Adding artist");

    let track_uid = Uid::parse(&record.track.uid)
        .with_context(|| format!("track {} has an unusable uid", record.track.document.name))?;
    let artist_uid = track_uid.artist_uid()?;

    match gateway.fetch_post(&artist_uid.to_string()).await {
        Ok(artist) => Ok(artist),
        Err(err) if err.is_not_found() => {
            warn!(
                track = %record.track.document.name,
                artist_uid = %artist_uid,
                "Artist not found, attaching placeholder"
            );
            Ok(Arc::new(placeholder_artist(&artist_uid)))
        }
        Err(err) => Err(err).with_context(|| {
            format!("fetching artist {} failed", artist_uid)
        }),
    }
}

/// Resolve the identity that uploaded the track.
///
/// Not-found is logged but still fails the record, unlike the artist stage.
pub async fn resolve_uploader(gateway: &dyn Gateway, record: &RawRecord) -> Result<Arc<Identity>> {
    debug!(track = %record.track.document.name, "Adding uploader identity");

    let created_by = record.track.created_by.with_context(|| {
        format!("track {} has no creator id", record.track.document.name)
    })?;

    match gateway.fetch_identity(created_by).await {
        Ok(identity) => Ok(identity),
        Err(err) => {
            if err.is_not_found() {
                warn!(
                    track = %record.track.document.name,
                    identity = created_by,
                    "Uploader identity not found"
                );
            }
            Err(err).with_context(|| format!("fetching identity {} failed", created_by))
        }
    }
}

/// Resolve the track's publication by label.
///
/// Any failure, label derivation included, yields a synthesized stand-in
/// with a title-cased label. Never fails the record.
pub async fn resolve_publication(
    gateway: &dyn Gateway,
    record: &RawRecord,
) -> Arc<Publication> {
    debug!(track = %record.track.document.name, "Adding publication");

    let label = Uid::parse(&record.track.uid)
        .ok()
        .and_then(|uid| uid.publication_label().map(str::to_string))
        .unwrap_or_default();

    match gateway.fetch_publication(&label).await {
        Ok(publication) => publication,
        Err(err) => {
            warn!(
                track = %record.track.document.name,
                label = %label,
                error = %err,
                "Could not fetch publication, synthesizing one"
            );
            Arc::new(Publication {
                title: titlecase(&label),
                label: Some(label),
            })
        }
    }
}

/// Derive the staging descriptor: cache path, asset URL, output directory
/// and archive base name. Pure computation, no I/O.
pub fn derive_staging(
    record: &EnrichedRecord,
    cache_root: &Path,
    output_root: &Path,
) -> Result<StagingDescriptor> {
    debug!(track = %record.track.document.name, "Adding staging metadata");

    let asset_url = record
        .track
        .document
        .audio_file_url
        .clone()
        .with_context(|| {
            format!("track {} has no audio file url", record.track.document.name)
        })?;

    let url = reqwest::Url::parse(&asset_url)
        .with_context(|| format!("track {} has an unusable audio file url", asset_url))?;
    let cache_file = cache_root.join(url.path().trim_start_matches('/'));

    Ok(StagingDescriptor {
        cache_file,
        asset_url,
        output_dir: output_root.join(record.year.to_string()),
        base_name: base_name(record),
    })
}

/// The archive base filename, per the national library delivery spec.
fn base_name(record: &EnrichedRecord) -> String {
    let artist_name = &record.artist.document.name;
    let track_name = &record.track.document.name;

    // Underscore is the field separator in the generated name; names that
    // contain one are ambiguous for the consumer. Flagged, not rewritten in
    // the document itself.
    if artist_name.contains('_') {
        warn!(artist = %artist_name, "Underscore in artist name");
    }
    if track_name.contains('_') {
        warn!(track = %track_name, "Underscore in track name");
    }

    let mut parts = vec![sanitize_name(artist_name), sanitize_name(track_name)];
    parts.extend(BASE_NAME_SUFFIX.iter().map(|s| s.to_string()));
    parts.join("_")
}

/// Make a name part safe for the archive filename: trim, map the separator
/// character `_` to `-`, keep alphanumerics plus space, hyphen and dot, drop
/// everything else.
pub fn sanitize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c == '_' { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '.'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// First letter of each word upper-cased, the rest lowered: `oa` → `Oa`.
pub fn titlecase(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
