#![allow(dead_code)]

mod fixtures;
mod server;
pub use fixtures::*;
pub use server::*;

// Re-export commonly used types from mailbot for tests
pub use mailbot::{
    Classification, DetectorConfig, Keypoint, MailBot, MailbotError, RegionOfInterest, Snapshot,
    StaticSource,
};
