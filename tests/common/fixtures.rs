use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use tempfile::NamedTempFile;

pub const FRAME_WIDTH: u32 = 1280;
pub const FRAME_HEIGHT: u32 = 720;
pub const HOLE_RADIUS: i32 = 15;

const MAILBOX_FRONT: Rgb<u8> = Rgb([40, 40, 40]);
const LIT_HOLE: Rgb<u8> = Rgb([230, 230, 230]);

/// Centers of the lit holes, inside the default region of interest
/// (rows 350..720, cols 400..900). Four per row.
pub fn hole_centers(holes: usize) -> Vec<(i32, i32)> {
    (0..holes)
        .map(|i| {
            let row = (i / 4) as i32;
            let col = (i % 4) as i32;
            (475 + col * 120, 535 - row * 90)
        })
        .collect()
}

/// A dark mailbox front with `holes` lit holes in the detection region.
pub fn mailbox_frame(holes: usize) -> RgbImage {
    let mut img = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, MAILBOX_FRONT);
    for center in hole_centers(holes) {
        draw_filled_circle_mut(&mut img, center, HOLE_RADIUS, LIT_HOLE);
    }
    img
}

/// Bright shapes in the detection region that must not count as holes:
/// a speck, a slot, an oversized disc and an L-shaped bracket.
pub fn add_decoys(img: &mut RgbImage) {
    draw_filled_circle_mut(img, (640, 400), 3, LIT_HOLE);
    draw_filled_rect_mut(img, Rect::at(450, 650).of_size(150, 8), LIT_HOLE);
    draw_filled_circle_mut(img, (780, 650), 45, LIT_HOLE);
    draw_filled_rect_mut(img, Rect::at(835, 360).of_size(55, 8), LIT_HOLE);
    draw_filled_rect_mut(img, Rect::at(835, 360).of_size(8, 50), LIT_HOLE);
}

/// A thin lit ring around `center` with its lower-right quarter missing.
/// Big enough for the area filter but far from convex.
pub fn add_open_ring(img: &mut RgbImage, center: (i32, i32)) {
    draw_filled_circle_mut(img, center, 30, LIT_HOLE);
    draw_filled_circle_mut(img, center, 27, MAILBOX_FRONT);
    draw_filled_rect_mut(img, Rect::at(center.0, center.1).of_size(31, 31), MAILBOX_FRONT);
}

/// A lit hole outside the detection region.
pub fn add_hole_outside_roi(img: &mut RgbImage) {
    draw_filled_circle_mut(img, (150, 150), HOLE_RADIUS, LIT_HOLE);
}

pub fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Png)
}

/// Writes the frame as a JPEG snapshot and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn write_jpeg_snapshot(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".jpeg")
        .tempfile()
        .expect("Failed to create temp image file");
    std::fs::write(file.path(), encode(img, ImageFormat::Jpeg)).expect("Failed to save test image");
    file
}
