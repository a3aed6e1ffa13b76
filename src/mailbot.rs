use std::path::{Path, PathBuf};

use time::macros::format_description;

use crate::config::{ClassifierPolicy, DetectorConfig, RegionOfInterest};
use crate::detection::{extraction_pipeline, preprocessing, run_extraction};
use crate::error::Result;
use crate::models::{Classification, Snapshot};
use crate::pipeline::{Pipeline, prepare_debug_root};
use crate::source::ImageSource;

/// One mailbox camera and how to read it.
///
/// Holds only read-only configuration, so runs never share mutable state.
pub struct MailBot<S> {
    source: S,
    roi: RegionOfInterest,
    detector: DetectorConfig,
    policy: ClassifierPolicy,
    debug_root: Option<PathBuf>,
}

impl<S: ImageSource> MailBot<S> {
    /// A bot with the default region, detector and policy.
    pub fn new(source: S) -> Self {
        Self {
            source,
            roi: RegionOfInterest::default(),
            detector: DetectorConfig::default(),
            policy: ClassifierPolicy::default(),
            debug_root: None,
        }
    }

    pub fn with_roi(mut self, roi: RegionOfInterest) -> Result<Self> {
        roi.validate()?;
        self.roi = roi;
        Ok(self)
    }

    pub fn with_detector(mut self, detector: DetectorConfig) -> Result<Self> {
        detector.validate()?;
        self.detector = detector;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Result<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    /// Save every run's step images in its own subdirectory of `output_dir`.
    /// The directory must be empty or not exist yet.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        prepare_debug_root(&output_dir)?;
        self.debug_root = Some(output_dir);
        Ok(self)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn roi(&self) -> &RegionOfInterest {
        &self.roi
    }

    /// Fetch one snapshot, extract keypoints and classify them.
    pub async fn run_once(&self) -> Result<Classification> {
        let snapshot = self.source.fetch().await?;
        log::debug!(
            "snapshot from {}: {} bytes at {}",
            snapshot.origin,
            snapshot.len(),
            snapshot.captured_at
        );

        let img = preprocessing::decode(&snapshot)?;
        let keypoints = run_extraction(&self.pipeline_for(&snapshot), img)?;
        let classification = self.policy.classify(&keypoints);

        log::info!(
            "{} keypoints in {} → {}",
            keypoints.len(),
            self.roi,
            classification
        );
        Ok(classification)
    }

    fn pipeline_for(&self, snapshot: &Snapshot) -> Pipeline {
        let pipeline = extraction_pipeline(self.roi, self.detector);
        match &self.debug_root {
            Some(root) => pipeline.with_debug(claim_run_dir(root, &run_dir_name(snapshot))),
            None => pipeline,
        }
    }
}

fn run_dir_name(snapshot: &Snapshot) -> String {
    let format = format_description!("[year][month][day]-[hour][minute][second]-[subsecond digits:3]");
    snapshot
        .captured_at
        .format(format)
        .unwrap_or_else(|_| snapshot.captured_at.unix_timestamp_nanos().to_string())
}

/// Creates `root/name`, or `root/name-2`, `root/name-3`, ... when runs share a
/// timestamp, so no run overwrites another's images.
fn claim_run_dir(root: &Path, name: &str) -> PathBuf {
    for attempt in 1u32.. {
        let candidate = if attempt == 1 {
            root.join(name)
        } else {
            root.join(format!("{name}-{attempt}"))
        };
        match std::fs::create_dir(&candidate) {
            Ok(()) => return candidate,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                log::warn!("cannot create debug run directory {}: {}", candidate.display(), e);
                return candidate;
            }
        }
    }
    root.join(name)
}
