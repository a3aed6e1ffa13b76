use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{MailbotError, Result};
use crate::models::Keypoint;

/// Bounding box relative to the image the step received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Data that flows through the pipeline.
/// Before blob detection there is one item per frame; afterwards one item per blob.
#[derive(Clone)]
pub struct PipelineData {
    /// The image data (color, inverted, cropped or grayscale depending on the step)
    pub image: DynamicImage,

    /// Where this item sits in its parent image (None means the whole image)
    pub bbox: Option<BoundingBox>,

    /// Set by blob detection
    pub keypoint: Option<Keypoint>,
}

impl PipelineData {
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            bbox: None,
            keypoint: None,
        }
    }

    /// Same metadata, new pixels
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            image,
            bbox: self.bbox,
            keypoint: self.keypoint,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Directory this run's step images are written to
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug directory names)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every step's images below `output_dir`
    pub fn with_debug(mut self, output_dir: PathBuf) -> Self {
        self.context.debug = Some(DebugConfig { output_dir });
        self
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name())
    }

    /// Run the steps in order on an input image
    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        let mut data = vec![PipelineData::from_image(input)];
        self.save_debug_outputs("00_input", &data);

        for (step_idx, step) in self.steps.iter().enumerate() {
            log::debug!("Running step: {} (processing {} items)", step.name(), data.len());

            data = step.process(data, &self.context)?;

            let step_dir_name = format!(
                "{:02}_{}",
                step_idx + 1,
                step.name().to_lowercase().replace(' ', "_")
            );
            self.save_debug_outputs(&step_dir_name, &data);

            log::debug!("  → {} items", data.len());
        }

        Ok(data)
    }

    /// Debug images are diagnostics; failing to write them never fails the run.
    fn save_debug_outputs(&self, step_dir_name: &str, data: &[PipelineData]) {
        let Some(debug) = &self.context.debug else {
            return;
        };
        let step_dir = debug.output_dir.join(step_dir_name);
        if let Err(e) = save_images(&step_dir, data) {
            log::warn!("Failed to save debug images to {}: {}", step_dir.display(), e);
        } else {
            log::debug!("  Debug: saved {} images to {}/", data.len(), step_dir_name);
        }
    }
}

fn save_images(step_dir: &Path, data: &[PipelineData]) -> anyhow::Result<()> {
    std::fs::create_dir_all(step_dir)?;
    for (idx, item) in data.iter().enumerate() {
        let output_path = step_dir.join(format!("{:02}.png", idx + 1));
        item.image.save(&output_path)?;
    }
    Ok(())
}

/// Check a debug output root: it must be empty or not exist yet.
/// Creates it when missing.
pub fn prepare_debug_root(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        let mut entries = std::fs::read_dir(output_dir).map_err(|e| {
            MailbotError::config(format!("cannot read debug directory {}: {e}", output_dir.display()))
        })?;
        if entries.next().is_some() {
            return Err(MailbotError::config(format!(
                "debug directory is not empty: {}",
                output_dir.display()
            )));
        }
    } else {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            MailbotError::config(format!("cannot create debug directory {}: {e}", output_dir.display()))
        })?;
    }
    Ok(())
}
