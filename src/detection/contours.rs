use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};

use crate::models::BlobShape;

/// Which side of a binarization level counts as blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels at or below the level.
    Dark,
    /// Pixels above the level.
    Bright,
}

impl Polarity {
    pub fn from_blob_color(blob_color: u8) -> Self {
        if blob_color == 0 {
            Polarity::Dark
        } else {
            Polarity::Bright
        }
    }
}

/// Mark pixels on the `polarity` side of `level` as foreground (255)
pub fn binarize(gray: &GrayImage, level: f32, polarity: Polarity) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let bright = gray.get_pixel(x, y)[0] as f32 > level;
        let foreground = match polarity {
            Polarity::Dark => !bright,
            Polarity::Bright => bright,
        };
        Luma([if foreground { 255 } else { 0 }])
    })
}

/// Trace the outer boundary of every connected foreground region and measure it
pub fn find_shapes(mask: &GrayImage) -> Vec<BlobShape> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .filter_map(|contour| BlobShape::from_boundary(&contour.points))
        .collect()
}

/// Whether the pixel under the shape's centroid is foreground.
/// Rings and crescents fail this.
pub fn center_in_mask(mask: &GrayImage, shape: &BlobShape) -> bool {
    let x = shape.center.0.round();
    let y = shape.center.1.round();
    if x < 0.0 || y < 0.0 || x >= mask.width() as f64 || y >= mask.height() as f64 {
        return false;
    }
    mask.get_pixel(x as u32, y as u32)[0] > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

    #[test]
    fn dark_polarity_includes_level() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[40u8, 50, 60][x as usize]]));
        let mask = binarize(&gray, 50.0, Polarity::Dark);
        assert_eq!(mask.as_raw(), &vec![255, 255, 0]);
        let mask = binarize(&gray, 50.0, Polarity::Bright);
        assert_eq!(mask.as_raw(), &vec![0, 0, 255]);
    }

    #[test]
    fn finds_one_shape_per_region() {
        let mut mask = GrayImage::new(120, 60);
        draw_filled_circle_mut(&mut mask, (30, 30), 12, Luma([255u8]));
        draw_filled_circle_mut(&mut mask, (90, 30), 12, Luma([255u8]));

        let shapes = find_shapes(&mask);
        assert_eq!(shapes.len(), 2);
        for shape in &shapes {
            assert!(shape.circularity() > 0.8, "circularity {}", shape.circularity());
            assert!(center_in_mask(&mask, shape));
        }
    }

    #[test]
    fn ring_center_is_not_in_mask() {
        let mut mask = GrayImage::new(60, 60);
        draw_hollow_circle_mut(&mut mask, (30, 30), 20, Luma([255u8]));

        let shapes = find_shapes(&mask);
        assert_eq!(shapes.len(), 1);
        assert!(!center_in_mask(&mask, &shapes[0]));
    }
}
