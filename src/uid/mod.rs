//! Pebbles hierarchical identifiers.
//!
//! A uid has the shape `klass:seg.seg.seg$oid`, e.g.
//! `post.track:apdm.bandwagon.2013.inner.oa$445898`. The klass names the
//! entity type, the dotted path places it in the catalog hierarchy, and the
//! optional oid is the terminal object id. For positional derivations the
//! grove API treats the oid as the final path segment, so the full path of
//! the example is `apdm.bandwagon.2013.inner.oa.445898`. Related entities
//! (the track's artist, its publication) are addressed by rearranging the
//! track's own full path, so the derivations live here next to the parser.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UidError {
    #[error("Malformed uid (expected klass:path[$oid]): {0}")]
    Malformed(String),

    #[error("Uid path too short to derive {wanted} from: {uid}")]
    PathTooShort { uid: String, wanted: &'static str },
}

/// A parsed pebbles uid.
///
/// Immutable once constructed; derivations return new values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uid {
    klass: String,
    path: Vec<String>,
    oid: Option<String>,
}

impl Uid {
    pub fn parse(raw: &str) -> Result<Self, UidError> {
        let (klass, rest) = raw
            .split_once(':')
            .ok_or_else(|| UidError::Malformed(raw.to_string()))?;

        let (path_part, oid) = match rest.split_once('$') {
            Some((path, oid)) => (path, Some(oid.to_string())),
            None => (rest, None),
        };

        if klass.is_empty() || path_part.is_empty() {
            return Err(UidError::Malformed(raw.to_string()));
        }
        if path_part.split('.').any(|seg| seg.is_empty()) {
            return Err(UidError::Malformed(raw.to_string()));
        }
        if matches!(&oid, Some(oid) if oid.is_empty()) {
            return Err(UidError::Malformed(raw.to_string()));
        }

        Ok(Self {
            klass: klass.to_string(),
            path: path_part.split('.').map(str::to_string).collect(),
            oid,
        })
    }

    pub fn klass(&self) -> &str {
        &self.klass
    }

    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    /// Path segments with the oid appended as the final segment.
    ///
    /// This is the view the positional derivations below are defined on.
    pub fn full_path(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.path.iter().map(String::as_str).collect();
        if let Some(oid) = &self.oid {
            segments.push(oid);
        }
        segments
    }

    /// Derive the uid of the artist that owns this track.
    ///
    /// A track's full path looks like `apdm.bandwagon.2013.inner.oa.445898`;
    /// the artist lives at `post.artist:apdm.bandwagon.oa$445898` — segments
    /// 0 and 1, then segment 4, with the final segment reused as the oid.
    pub fn artist_uid(&self) -> Result<Uid, UidError> {
        let full = self.full_path();
        if full.len() < 5 {
            return Err(UidError::PathTooShort {
                uid: self.to_string(),
                wanted: "artist uid",
            });
        }
        let path = vec![
            full[0].to_string(),
            full[1].to_string(),
            full[4].to_string(),
        ];
        let oid = full.last().map(|seg| seg.to_string());
        Ok(Uid {
            klass: "post.artist".to_string(),
            path,
            oid,
        })
    }

    /// The publication label for this track: the second-to-last segment of
    /// the full path (e.g. `oa` in `apdm.bandwagon.2013.inner.oa.445898`).
    pub fn publication_label(&self) -> Option<&str> {
        let full = self.full_path();
        if full.len() < 2 {
            return None;
        }
        Some(full[full.len() - 2])
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.klass, self.path.join("."))?;
        if let Some(oid) = &self.oid {
            write!(f, "${}", oid)?;
        }
        Ok(())
    }
}
