use crate::config::{DetectorConfig, RegionOfInterest};
use crate::detection::{BlobDetector, preprocessing};
use crate::error::Result;
use crate::pipeline::{BoundingBox, PipelineContext, PipelineData, PipelineStep};

/// Complement every channel of the full frame
pub struct InvertStep;

impl PipelineStep for InvertStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .iter()
            .map(|item| item.with_image(preprocessing::invert(&item.image)))
            .collect())
    }

    fn name(&self) -> &str {
        "Inversion"
    }
}

/// Crop to the fixed region of interest
pub struct RoiCropStep {
    pub roi: RegionOfInterest,
}

impl PipelineStep for RoiCropStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let cropped = preprocessing::crop_roi(&item.image, &self.roi)?;
            let mut new_item = item.with_image(cropped);
            new_item.bbox = Some(BoundingBox {
                x: self.roi.col_start,
                y: self.roi.row_start,
                width: self.roi.width(),
                height: self.roi.height(),
            });
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "ROI Crop"
    }
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .iter()
            .map(|item| {
                let gray = preprocessing::to_grayscale(&item.image);
                item.with_image(image::DynamicImage::ImageLuma8(gray))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Detect blobs - splits one image into one item per keypoint
pub struct BlobDetectionStep {
    pub config: DetectorConfig,
    /// Border kept around each blob in its crop
    pub padding: u32,
}

impl PipelineStep for BlobDetectionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let detector = BlobDetector::new(self.config);
        let mut result = Vec::new();

        for item in data {
            let gray = item.image.to_luma8();
            let (img_width, img_height) = gray.dimensions();

            for keypoint in detector.detect(&gray) {
                // Crop around the blob, clamped to image boundaries
                let reach = keypoint.diameter / 2.0 + self.padding as f32;
                let min_x = (keypoint.x - reach).max(0.0) as u32;
                let min_y = (keypoint.y - reach).max(0.0) as u32;
                let max_x = ((keypoint.x + reach) as u32).min(img_width - 1);
                let max_y = ((keypoint.y + reach) as u32).min(img_height - 1);

                let bbox = BoundingBox {
                    x: min_x,
                    y: min_y,
                    width: max_x.saturating_sub(min_x) + 1,
                    height: max_y.saturating_sub(min_y) + 1,
                };
                let cropped = item.image.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);

                result.push(PipelineData {
                    image: cropped,
                    bbox: Some(bbox),
                    keypoint: Some(keypoint),
                });
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Blob Detection"
    }
}
