use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageError, ImageReader};

use crate::config::RegionOfInterest;
use crate::error::Result;
use crate::models::Snapshot;

/// Decode snapshot bytes, guessing the format from their content
pub fn decode(snapshot: &Snapshot) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(&snapshot.bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .decode()?;
    Ok(img)
}

/// Complement every color channel
pub fn invert(img: &DynamicImage) -> DynamicImage {
    let mut inverted = img.clone();
    inverted.invert();
    inverted
}

/// Crop to the region of interest, failing if it does not fit the image
pub fn crop_roi(img: &DynamicImage, roi: &RegionOfInterest) -> Result<DynamicImage> {
    roi.check_within(img.width(), img.height())?;
    Ok(img.crop_imm(roi.col_start, roi.row_start, roi.width(), roi.height()))
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}
