use std::f64::consts::PI;
use std::fmt;

use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use time::OffsetDateTime;

/// Encoded image bytes as fetched, plus when and where they came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub bytes: Vec<u8>,
    pub captured_at: OffsetDateTime,
    pub origin: String,
}

impl Snapshot {
    pub fn new(bytes: Vec<u8>, origin: impl Into<String>) -> Self {
        Self {
            bytes,
            captured_at: OffsetDateTime::now_utc(),
            origin: origin.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A detected blob, in region-of-interest coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub diameter: f32,
    /// Number of threshold levels the blob was found at.
    pub response: f32,
}

/// Outcome of one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    MailArrived,
    MailNotArrived,
    MailNotDetected,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::MailArrived,
        Classification::MailNotArrived,
        Classification::MailNotDetected,
    ];

    /// Name of the downstream action that handles this outcome.
    pub fn action_name(&self) -> &'static str {
        match self {
            Classification::MailArrived => "mail_arrived",
            Classification::MailNotArrived => "mail_not_arrived",
            Classification::MailNotDetected => "mail_not_detected",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

/// Shape metrics of one traced blob boundary.
///
/// Area and centroid come from the polygon moments of the boundary, so a
/// blob's area is the area enclosed by its outer pixel centers.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobShape {
    pub area: f64,
    pub center: (f64, f64),
    pub perimeter: f64,
    pub hull_area: f64,
    /// Median distance from the center to the boundary.
    pub radius: f64,
    mu20: f64,
    mu11: f64,
    mu02: f64,
}

impl BlobShape {
    /// Measures a closed boundary. Returns `None` for boundaries enclosing no area.
    pub fn from_boundary(points: &[Point<i32>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let (mut a00, mut a10, mut a01) = (0.0f64, 0.0f64, 0.0f64);
        let (mut a20, mut a11, mut a02) = (0.0f64, 0.0f64, 0.0f64);
        let mut perimeter = 0.0;

        let mut prev = points[points.len() - 1];
        for &curr in points {
            let (x0, y0) = (prev.x as f64, prev.y as f64);
            let (x1, y1) = (curr.x as f64, curr.y as f64);

            let dxy = x0 * y1 - x1 * y0;
            let xs = x0 + x1;
            let ys = y0 + y1;

            a00 += dxy;
            a10 += dxy * xs;
            a01 += dxy * ys;
            a20 += dxy * (x0 * xs + x1 * x1);
            a11 += dxy * (x0 * (ys + y0) + x1 * (ys + y1));
            a02 += dxy * (y0 * ys + y1 * y1);

            perimeter += (x1 - x0).hypot(y1 - y0);
            prev = curr;
        }

        // Orientation of the traced boundary decides the sign.
        let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
        let m00 = sign * a00 / 2.0;
        if m00 < f64::EPSILON {
            return None;
        }
        let m10 = sign * a10 / 6.0;
        let m01 = sign * a01 / 6.0;
        let m20 = sign * a20 / 12.0;
        let m11 = sign * a11 / 24.0;
        let m02 = sign * a02 / 12.0;

        let cx = m10 / m00;
        let cy = m01 / m00;

        let hull = convex_hull(points);
        let hull_area = polygon_area(&hull);

        let mut distances: Vec<f64> = points
            .iter()
            .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
            .collect();
        distances.sort_by(f64::total_cmp);
        let n = distances.len();
        let radius = (distances[(n - 1) / 2] + distances[n / 2]) / 2.0;

        Some(Self {
            area: m00,
            center: (cx, cy),
            perimeter,
            hull_area,
            radius,
            mu20: m20 - m10 * cx,
            mu11: m11 - m10 * cy,
            mu02: m02 - m01 * cy,
        })
    }

    /// 4π·area / perimeter². 1.0 for a perfect circle.
    pub fn circularity(&self) -> f64 {
        if self.perimeter == 0.0 {
            return 0.0;
        }
        4.0 * PI * self.area / (self.perimeter * self.perimeter)
    }

    /// Area over convex hull area.
    pub fn convexity(&self) -> f64 {
        if self.hull_area == 0.0 {
            return 0.0;
        }
        self.area / self.hull_area
    }

    /// Ratio of the minor to the major principal second moment.
    /// 1.0 for a circle, towards 0.0 for a line.
    pub fn inertia_ratio(&self) -> f64 {
        let denominator = (2.0 * self.mu11).hypot(self.mu20 - self.mu02);
        if denominator <= 0.01 {
            return 1.0;
        }

        let cos_min = (self.mu20 - self.mu02) / denominator;
        let sin_min = 2.0 * self.mu11 / denominator;
        let half_sum = 0.5 * (self.mu20 + self.mu02);
        let half_diff = 0.5 * (self.mu20 - self.mu02);

        let i_min = half_sum - half_diff * cos_min - self.mu11 * sin_min;
        let i_max = half_sum + half_diff * cos_min + self.mu11 * sin_min;
        if i_max == 0.0 {
            return 1.0;
        }
        i_min / i_max
    }
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    let mut prev = points[points.len() - 1];
    for &curr in points {
        twice_area += prev.x as f64 * curr.y as f64 - curr.x as f64 * prev.y as f64;
        prev = curr;
    }
    twice_area.abs() / 2.0
}
