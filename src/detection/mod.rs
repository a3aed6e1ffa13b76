pub mod preprocessing;
pub mod contours;
pub mod circles;
pub mod steps;

use std::sync::Arc;

use image::{DynamicImage, GrayImage};

use crate::config::{DetectorConfig, RegionOfInterest};
use crate::error::Result;
use crate::models::{Keypoint, Snapshot};
use crate::pipeline::Pipeline;
use circles::LevelCenter;
use contours::Polarity;

/// Thresholded blob detector.
///
/// The grayscale image is binarized at every configured level. Each
/// connected region is measured from its traced boundary and kept only if it
/// passes every enabled filter; regions that recur at enough levels become
/// keypoints.
#[derive(Debug, Clone, Copy)]
pub struct BlobDetector {
    config: DetectorConfig,
}

impl BlobDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn polarities(&self) -> Vec<Polarity> {
        if self.config.filter_by_color {
            vec![Polarity::from_blob_color(self.config.blob_color)]
        } else {
            vec![Polarity::Dark, Polarity::Bright]
        }
    }

    /// Blobs accepted at a single binarization level
    pub fn detect_at_level(&self, gray: &GrayImage, level: f32) -> Vec<LevelCenter> {
        let mut centers = Vec::new();
        for polarity in self.polarities() {
            let mask = contours::binarize(gray, level, polarity);
            centers.extend(
                contours::find_shapes(&mask)
                    .iter()
                    .filter(|shape| {
                        !self.config.filter_by_color || contours::center_in_mask(&mask, shape)
                    })
                    .filter(|shape| circles::passes_filters(shape, &self.config))
                    .map(LevelCenter::from),
            );
        }
        centers
    }

    pub fn detect(&self, gray: &GrayImage) -> Vec<Keypoint> {
        let levels: Vec<Vec<LevelCenter>> = self
            .config
            .threshold_levels()
            .into_iter()
            .map(|level| {
                let centers = self.detect_at_level(gray, level);
                log::trace!("threshold {level}: {} candidate blobs", centers.len());
                centers
            })
            .collect();
        circles::group_levels(&levels, &self.config)
    }
}

/// Extraction steps: invert the frame, crop to `roi`, grayscale, detect blobs
pub fn extraction_pipeline(roi: RegionOfInterest, config: DetectorConfig) -> Pipeline {
    use steps::*;

    Pipeline::new()
        .add_step(Arc::new(InvertStep))
        .add_step(Arc::new(RoiCropStep { roi }))
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(BlobDetectionStep { config, padding: 5 }))
}

/// Run an extraction pipeline on a decoded frame and collect its keypoints
pub fn run_extraction(pipeline: &Pipeline, img: DynamicImage) -> Result<Vec<Keypoint>> {
    Ok(pipeline
        .run(img)?
        .into_iter()
        .filter_map(|item| item.keypoint)
        .collect())
}

/// Decode a snapshot and find the blob keypoints inside `roi`.
///
/// Keypoint positions are relative to the region's top-left corner.
pub fn extract(
    snapshot: &Snapshot,
    roi: &RegionOfInterest,
    config: &DetectorConfig,
) -> Result<Vec<Keypoint>> {
    config.validate()?;
    roi.validate()?;
    let img = preprocessing::decode(snapshot)?;
    run_extraction(&extraction_pipeline(*roi, *config), img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn inverted_roi() -> GrayImage {
        // Dark holes on a light background, as the inverted frame looks
        GrayImage::from_pixel(300, 200, Luma([215u8]))
    }

    #[test]
    fn circles_are_found_at_every_level() {
        let mut gray = inverted_roi();
        draw_filled_circle_mut(&mut gray, (60, 100), 15, Luma([25u8]));

        let detector = BlobDetector::new(DetectorConfig::default());
        let keypoints = detector.detect(&gray);
        assert_eq!(keypoints.len(), 1);

        let kp = keypoints[0];
        assert!((kp.x - 60.0).abs() < 1.0);
        assert!((kp.y - 100.0).abs() < 1.0);
        assert!((kp.diameter - 30.0).abs() < 3.0, "diameter {}", kp.diameter);
        assert_eq!(kp.response, 17.0);
    }

    #[test]
    fn shapes_failing_a_filter_are_rejected() {
        let mut gray = inverted_roi();
        // too small
        draw_filled_circle_mut(&mut gray, (40, 40), 3, Luma([25u8]));
        // too elongated
        draw_filled_rect_mut(&mut gray, Rect::at(100, 20).of_size(120, 6), Luma([25u8]));
        // too large
        draw_filled_circle_mut(&mut gray, (150, 120), 45, Luma([25u8]));

        let detector = BlobDetector::new(DetectorConfig::default());
        assert!(detector.detect(&gray).is_empty());
    }

    #[test]
    fn bright_blobs_ignored_with_dark_blob_color() {
        let mut gray = GrayImage::from_pixel(200, 200, Luma([25u8]));
        draw_filled_circle_mut(&mut gray, (100, 100), 15, Luma([215u8]));

        let dark = BlobDetector::new(DetectorConfig::default());
        assert!(dark.detect(&gray).is_empty());

        let bright = BlobDetector::new(DetectorConfig {
            blob_color: 255,
            ..DetectorConfig::default()
        });
        assert_eq!(bright.detect(&gray).len(), 1);
    }

    #[test]
    fn disabling_area_filter_admits_small_blobs() {
        let mut gray = inverted_roi();
        draw_filled_circle_mut(&mut gray, (40, 40), 4, Luma([25u8]));

        let mut config = DetectorConfig::default();
        assert!(BlobDetector::new(config).detect(&gray).is_empty());
        config.area.enabled = false;
        assert_eq!(BlobDetector::new(config).detect(&gray).len(), 1);
    }
}
