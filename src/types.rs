//! Core types for cardfetch
//!
//! Catalog records are validated into typed structs once, at the client
//! boundary; everything downstream works with these types rather than
//! dict-shaped JSON. The [`Job`] struct doubles as the ledger row format
//! (serialized through the csv crate), so its field order is the ledger's
//! column order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One upstream catalog entry (a card), as returned by the search API
///
/// Unknown fields are ignored; the fields below are the only ones the
/// pipeline consumes. All name variants are optional — resolution order is
/// decided by [`crate::descriptor`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CardRecord {
    /// Stable upstream identifier
    #[serde(default)]
    pub id: String,

    /// Canonical (oracle) name
    #[serde(default)]
    pub name: Option<String>,

    /// Localized printed name, when it differs from the canonical name
    #[serde(default)]
    pub printed_name: Option<String>,

    /// Alternate flavor name (e.g. crossover printings)
    #[serde(default)]
    pub flavor_name: Option<String>,

    /// Layout tag (e.g. "normal", "split", "flip", "transform")
    #[serde(default)]
    pub layout: String,

    /// Collector number within the set
    #[serde(default)]
    pub collector_number: String,

    /// Set code this printing belongs to
    #[serde(default)]
    pub set: Option<String>,

    /// Card-level image URIs (absent for most multi-face layouts)
    #[serde(default)]
    pub image_uris: Option<ImageUris>,

    /// Faces, for layouts that have them
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
}

/// One face of a multi-face card
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CardFace {
    /// Face name
    #[serde(default)]
    pub name: Option<String>,

    /// Localized printed name for this face
    #[serde(default)]
    pub printed_name: Option<String>,

    /// Alternate flavor name for this face
    #[serde(default)]
    pub flavor_name: Option<String>,

    /// Face-level image URIs
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

/// Image URIs at the sizes the catalog offers
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageUris {
    /// Lossless PNG rendition
    #[serde(default)]
    pub png: Option<String>,

    /// Large JPG rendition
    #[serde(default)]
    pub large: Option<String>,

    /// Normal JPG rendition
    #[serde(default)]
    pub normal: Option<String>,

    /// Small JPG rendition
    #[serde(default)]
    pub small: Option<String>,
}

impl ImageUris {
    /// Pick the best available rendition: large, then png, then normal,
    /// then small
    pub fn best(&self) -> Option<&str> {
        self.large
            .as_deref()
            .or(self.png.as_deref())
            .or(self.normal.as_deref())
            .or(self.small.as_deref())
    }
}

/// Card layout, parsed from the record's layout tag
///
/// Only the layouts that change image fan-out are distinguished; everything
/// else is [`Layout::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Two half-cards printed sideways on one image
    Split,
    /// Split variant read top-then-bottom
    Aftermath,
    /// One image, second face upside down
    Flip,
    /// Creature plus adventure side, one image
    Adventure,
    /// Any other layout (normal, transform, modal_dfc, ...)
    Other,
}

impl Layout {
    /// Parse a layout tag. Never fails; unknown tags are [`Layout::Other`].
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "split" => Layout::Split,
            "aftermath" => Layout::Aftermath,
            "flip" => Layout::Flip,
            "adventure" => Layout::Adventure,
            _ => Layout::Other,
        }
    }
}

/// One planned single-file fetch produced by the descriptor transform
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Source URL for the image bytes
    pub url: String,
    /// Display name the target file name is derived from
    pub display_name: String,
    /// 1-based face index within the source record
    pub face_index: u32,
    /// Post-processing hint for the fetched bytes
    pub rotate: RotateHint,
}

/// Post-processing hint attached to a job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotateHint {
    /// No post-processing
    #[default]
    None,
    /// Rotate 180 degrees (flip layout, face 2)
    Rot180,
    /// Rotate 90 degrees if the image is horizontal (split/aftermath)
    Horizontal90,
}

impl RotateHint {
    /// Stable wire form used in the ledger's rotate column
    pub fn as_str(&self) -> &'static str {
        match self {
            RotateHint::None => "",
            RotateHint::Rot180 => "rot180",
            RotateHint::Horizontal90 => "h90",
        }
    }

    /// True when the hint forces a re-encode (output format becomes JPG)
    pub fn forces_reencode(&self) -> bool {
        !matches!(self, RotateHint::None)
    }
}

impl fmt::Display for RotateHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotateHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(RotateHint::None),
            "rot180" => Ok(RotateHint::Rot180),
            "h90" => Ok(RotateHint::Horizontal90),
            other => Err(format!("unknown rotate hint: {other:?}")),
        }
    }
}

impl Serialize for RotateHint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RotateHint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Job status as recorded in the ledger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobStatus {
    /// Not yet fetched (or needs re-fetching)
    #[default]
    Pending,
    /// Target file written and verified on disk
    Done,
    /// Last attempt exhausted retries
    Failed,
}

impl JobStatus {
    /// Stable wire form used in the ledger's status column
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Status is deliberately lenient on input: a missing or unrecognized value
// parses as Pending, so an externally edited ledger degrades to re-fetching
// rather than failing to load.
impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "done" => JobStatus::Done,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        })
    }
}

/// One planned unit of work: a single target file derived from one
/// (record, descriptor) pair
///
/// Field order is the ledger column order. Everything except `status` and
/// `error` is a job *definition* and must not change between runs unless the
/// collection is rebuilt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    /// Collection (set) this job belongs to, upper-cased
    pub collection: String,

    /// Upstream record identifier the job was derived from
    pub record_id: String,

    /// Layout tag of the source record
    #[serde(default)]
    pub layout: String,

    /// 1-based face index within the source record
    pub face: u32,

    /// Source URL for the image bytes
    pub image_url: String,

    /// Target file name (not a full path; unique within the collection)
    pub target: String,

    /// Post-processing hint
    #[serde(default)]
    pub rotate: RotateHint,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Last error message, empty if none
    #[serde(default)]
    pub error: String,
}

/// Outcome of one finished job, as recorded in the completion log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Target file written successfully
    Done,
    /// Retries exhausted or permanent upstream failure
    Failed,
}

/// Counts reported by one fetch executor run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs fetched successfully during this run
    pub succeeded: usize,
    /// Jobs that exhausted retries or hit a permanent error
    pub failed: usize,
    /// Jobs already satisfied before the run (no network activity)
    pub skipped: usize,
}
