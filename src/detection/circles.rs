use crate::config::DetectorConfig;
use crate::models::{BlobShape, Keypoint};

/// A blob seen at a single binarization level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCenter {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl From<&BlobShape> for LevelCenter {
    fn from(shape: &BlobShape) -> Self {
        Self {
            x: shape.center.0,
            y: shape.center.1,
            radius: shape.radius,
        }
    }
}

/// Whether a shape passes every enabled area/circularity/convexity/inertia filter
pub fn passes_filters(shape: &BlobShape, config: &DetectorConfig) -> bool {
    config.area.accepts(shape.area as f32)
        && config.circularity.accepts(shape.circularity() as f32)
        && config.convexity.accepts(shape.convexity() as f32)
        && config.inertia_ratio.accepts(shape.inertia_ratio() as f32)
}

/// Merge per-level centers into blobs and keep those seen often enough.
///
/// A center joins the first existing group whose median-radius member lies
/// within `min_dist_between_blobs` or within either radius. Groups stay sorted
/// by radius.
pub fn group_levels(levels: &[Vec<LevelCenter>], config: &DetectorConfig) -> Vec<Keypoint> {
    let mut groups: Vec<Vec<LevelCenter>> = Vec::new();

    for level in levels {
        let mut new_groups = Vec::new();

        for &center in level {
            let existing = groups.iter_mut().find(|group| {
                let middle = group[group.len() / 2];
                let dist = (middle.x - center.x).hypot(middle.y - center.y);
                dist < config.min_dist_between_blobs as f64
                    || dist < middle.radius
                    || dist < center.radius
            });

            match existing {
                Some(group) => {
                    let pos = group.partition_point(|c| c.radius <= center.radius);
                    group.insert(pos, center);
                }
                None => new_groups.push(vec![center]),
            }
        }

        groups.extend(new_groups);
    }

    groups
        .into_iter()
        .filter(|group| group.len() >= config.min_repeatability)
        .map(|group| {
            let n = group.len() as f64;
            let x = group.iter().map(|c| c.x).sum::<f64>() / n;
            let y = group.iter().map(|c| c.y).sum::<f64>() / n;
            Keypoint {
                x: x as f32,
                y: y as f32,
                diameter: (group[group.len() / 2].radius * 2.0) as f32,
                response: n as f32,
            }
        })
        .collect()
}
