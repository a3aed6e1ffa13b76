//! Error kinds surfaced by a detection run.

use thiserror::Error;

use crate::config::RegionOfInterest;

/// Everything that can stop a run from producing a [`Classification`](crate::Classification).
///
/// None of these are retried or swallowed inside the crate; the caller decides
/// whether a failed run is skipped, retried or alerted on.
#[derive(Debug, Error)]
pub enum MailbotError {
    /// The snapshot could not be fetched, or the source returned no bytes.
    #[error("failed to retrieve snapshot from {source_name}: {reason}")]
    Retrieval {
        /// URL or path the snapshot was requested from.
        source_name: String,
        /// Transport-level description of the failure.
        reason: String,
    },

    /// The fetched bytes are not an image the decoder understands.
    #[error("snapshot is not a decodable image: {0}")]
    Decode(#[from] image::ImageError),

    /// The region of interest does not fit inside the decoded frame.
    #[error("region of interest {roi} exceeds image bounds {width}x{height}")]
    Bounds {
        roi: RegionOfInterest,
        width: u32,
        height: u32,
    },

    /// A detector, region or source parameter is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MailbotError {
    pub fn retrieval(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Retrieval {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MailbotError>;
