//! Post-processing seam for fetched image bytes
//!
//! Jobs carry a [`RotateHint`] describing the cosmetic transform their bytes
//! should receive before hitting disk (flip faces are stored upside down at
//! the source; split layouts are printed sideways). The transform itself is
//! an external concern — this module only defines the seam and a pass-through
//! default, so the fetch pipeline stays independent of any image codec.
//!
//! Implementations must be pure with respect to the pipeline: same bytes and
//! hint in, same bytes out, no filesystem access. The executor applies the
//! transform strictly between fetch and the atomic write.
//!
//! Note for implementors: any job whose hint forces a re-encode has its
//! target extension fixed to `.jpg` at manifest-build time, so a real
//! processor must emit JPEG for those hints.

use crate::error::Result;
use crate::types::RotateHint;

/// Transform applied to fetched bytes before they are written
pub trait PostProcessor: Send + Sync {
    /// Apply the transform selected by `hint` to `bytes`
    ///
    /// [`RotateHint::None`] must return the bytes unchanged. Errors are
    /// treated as job failures by the executor (recorded, not fatal to
    /// sibling jobs).
    fn apply(&self, bytes: Vec<u8>, hint: RotateHint) -> Result<Vec<u8>>;
}

/// Pass-through implementation: every hint returns the bytes unchanged
///
/// This is the default when no image tooling is plugged in. Files for
/// rotated variants are then byte-identical to their source rendition,
/// which is still a correct, resumable download.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpPostProcessor;

impl PostProcessor for NoOpPostProcessor {
    fn apply(&self, bytes: Vec<u8>, hint: RotateHint) -> Result<Vec<u8>> {
        if hint.forces_reencode() {
            tracing::debug!(hint = %hint, "no post-processor configured, passing bytes through");
        }
        Ok(bytes)
    }
}
