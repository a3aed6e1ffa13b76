pub mod classify;
pub mod config;
pub mod detection;
pub mod error;
pub mod mailbot;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod source;

pub use classify::classify;
pub use config::{ClassifierPolicy, DetectorConfig, RangeFilter, RegionOfInterest};
pub use detection::{BlobDetector, extract};
pub use error::{MailbotError, Result};
pub use mailbot::MailBot;
pub use models::{Classification, Keypoint, Snapshot};
pub use notify::Dispatch;
pub use pipeline::{BoundingBox, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use scheduler::{RunStats, Scheduler};
pub use source::{ConfiguredSource, FileSource, HttpSource, ImageSource, StaticSource};
