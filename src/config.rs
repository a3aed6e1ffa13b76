use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MailbotError, Result};

/// Snapshot endpoint of the mailbox camera.
pub const DEFAULT_SNAP_URL: &str = "http://172.17.2.213/snap.jpeg";

/// Every five minutes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One level per 8-bit intensity.
pub const MAX_THRESHOLD_LEVELS: usize = 256;

/// One blob metric filter. A value passes when `min <= value < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    pub enabled: bool,
    pub min: f32,
    pub max: f32,
}

impl RangeFilter {
    pub const fn at_least(min: f32) -> Self {
        Self {
            enabled: true,
            min,
            max: f32::MAX,
        }
    }

    pub const fn between(min: f32, max: f32) -> Self {
        Self {
            enabled: true,
            min,
            max,
        }
    }

    pub fn accepts(&self, value: f32) -> bool {
        !self.enabled || (value >= self.min && value < self.max)
    }
}

/// Blob detector parameters.
///
/// The grayscale region is binarized at every level in
/// `min_threshold..max_threshold` (stepping by `threshold_step`); blobs found
/// at `min_repeatability` or more levels, and passing every enabled filter,
/// become keypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub min_threshold: f32,
    pub max_threshold: f32,
    pub threshold_step: f32,
    pub min_repeatability: usize,
    pub min_dist_between_blobs: f32,

    /// Keep only blobs whose center has `blob_color` in the binarized image
    /// (0 = darker than the surroundings).
    pub filter_by_color: bool,
    pub blob_color: u8,

    pub area: RangeFilter,
    pub circularity: RangeFilter,
    pub convexity: RangeFilter,
    pub inertia_ratio: RangeFilter,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_threshold: 50.0,
            max_threshold: 220.0,
            threshold_step: 10.0,
            min_repeatability: 2,
            min_dist_between_blobs: 10.0,
            filter_by_color: true,
            blob_color: 0,
            area: RangeFilter::between(100.0, 5000.0),
            circularity: RangeFilter::at_least(0.7),
            convexity: RangeFilter::at_least(0.2),
            inertia_ratio: RangeFilter::at_least(0.01),
        }
    }
}

impl DetectorConfig {
    /// Binarization levels, lowest first. Never more than
    /// [`MAX_THRESHOLD_LEVELS`] + 1; `validate` rejects configs that hit the cap.
    pub fn threshold_levels(&self) -> Vec<f32> {
        if !(self.threshold_step > 0.0) {
            return Vec::new();
        }
        (0..=MAX_THRESHOLD_LEVELS)
            .map(|i| self.min_threshold + i as f32 * self.threshold_step)
            .take_while(|&level| level < self.max_threshold)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_step > 0.0) {
            return Err(MailbotError::config(format!(
                "threshold step must be positive, got {}",
                self.threshold_step
            )));
        }
        if !(0.0..=255.0).contains(&self.min_threshold)
            || !(0.0..=256.0).contains(&self.max_threshold)
            || self.min_threshold >= self.max_threshold
        {
            return Err(MailbotError::config(format!(
                "threshold range {}..{} is not a valid 8-bit range",
                self.min_threshold, self.max_threshold
            )));
        }
        let levels = self.threshold_levels().len();
        if levels > MAX_THRESHOLD_LEVELS {
            return Err(MailbotError::config(format!(
                "threshold step {} gives more than {MAX_THRESHOLD_LEVELS} levels",
                self.threshold_step
            )));
        }
        if self.min_repeatability == 0 || self.min_repeatability > levels {
            return Err(MailbotError::config(format!(
                "min repeatability {} must be between 1 and the {} threshold levels",
                self.min_repeatability, levels
            )));
        }
        if !(self.min_dist_between_blobs >= 0.0) {
            return Err(MailbotError::config(format!(
                "min distance between blobs must not be negative, got {}",
                self.min_dist_between_blobs
            )));
        }

        check_filter("area", &self.area, false)?;
        check_filter("circularity", &self.circularity, true)?;
        check_filter("convexity", &self.convexity, true)?;
        check_filter("inertia ratio", &self.inertia_ratio, true)?;
        Ok(())
    }
}

fn check_filter(name: &str, filter: &RangeFilter, is_ratio: bool) -> Result<()> {
    if !filter.enabled {
        return Ok(());
    }
    if !(filter.min > 0.0) {
        return Err(MailbotError::config(format!(
            "minimum {name} must be positive, got {}",
            filter.min
        )));
    }
    if is_ratio && filter.min > 1.0 {
        return Err(MailbotError::config(format!(
            "minimum {name} must lie in (0, 1], got {}",
            filter.min
        )));
    }
    if filter.max <= filter.min {
        return Err(MailbotError::config(format!(
            "maximum {name} {} must exceed minimum {}",
            filter.max, filter.min
        )));
    }
    Ok(())
}

/// Fixed rectangle of the frame that detection runs on, in pixels.
/// Starts are inclusive, ends exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

impl Default for RegionOfInterest {
    /// Mailbox slot in the lower middle of a 1280x720 frame.
    fn default() -> Self {
        Self {
            row_start: 350,
            row_end: 720,
            col_start: 400,
            col_end: 900,
        }
    }
}

impl RegionOfInterest {
    pub fn new(row_start: u32, row_end: u32, col_start: u32, col_end: u32) -> Result<Self> {
        let roi = Self {
            row_start,
            row_end,
            col_start,
            col_end,
        };
        roi.validate()?;
        Ok(roi)
    }

    /// Rejects empty or reversed rectangles.
    pub fn validate(&self) -> Result<()> {
        if self.row_start >= self.row_end || self.col_start >= self.col_end {
            return Err(MailbotError::config(format!("region of interest {self} is empty")));
        }
        Ok(())
    }

    /// Zero for a reversed rectangle.
    pub fn width(&self) -> u32 {
        self.col_end.saturating_sub(self.col_start)
    }

    pub fn height(&self) -> u32 {
        self.row_end.saturating_sub(self.row_start)
    }

    /// Fails with [`MailbotError::Config`] for an empty region and with
    /// [`MailbotError::Bounds`] unless it fits a `width` x `height` frame.
    pub fn check_within(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        if self.row_end > height || self.col_end > width {
            return Err(MailbotError::Bounds {
                roi: *self,
                width,
                height,
            });
        }
        Ok(())
    }
}

impl fmt::Display for RegionOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{}, cols {}..{}",
            self.row_start, self.row_end, self.col_start, self.col_end
        )
    }
}

impl FromStr for RegionOfInterest {
    type Err = MailbotError;

    /// Parses `ROW_START:ROW_END,COL_START:COL_END`, e.g. `350:720,400:900`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            MailbotError::config(format!(
                "expected ROW_START:ROW_END,COL_START:COL_END, got {s:?}"
            ))
        };
        let (rows, cols) = s.split_once(',').ok_or_else(invalid)?;
        let span = |part: &str| -> Result<(u32, u32)> {
            let (start, end) = part.split_once(':').ok_or_else(invalid)?;
            let start = start.trim().parse().map_err(|_| invalid())?;
            let end = end.trim().parse().map_err(|_| invalid())?;
            Ok((start, end))
        };
        let (row_start, row_end) = span(rows)?;
        let (col_start, col_end) = span(cols)?;
        Self::new(row_start, row_end, col_start, col_end)
    }
}

/// Keypoint counts the classifier treats as decisive.
///
/// An empty mailbox shows all of its lit holes; mail covers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierPolicy {
    pub arrived_count: usize,
    pub not_arrived_count: usize,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            arrived_count: 0,
            not_arrived_count: 4,
        }
    }
}

impl ClassifierPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.arrived_count == self.not_arrived_count {
            return Err(MailbotError::config(format!(
                "arrived and not-arrived counts must differ, both are {}",
                self.arrived_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_detector_thresholds() {
        let config = DetectorConfig::default();
        assert_eq!(config.area.min, 100.0);
        assert_eq!(config.circularity.min, 0.7);
        assert_eq!(config.convexity.min, 0.2);
        assert_eq!(config.inertia_ratio.min, 0.01);
        assert!(config.area.enabled);
        assert!(config.circularity.enabled);
        assert!(config.convexity.enabled);
        assert!(config.inertia_ratio.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn threshold_levels_exclude_max() {
        let levels = DetectorConfig::default().threshold_levels();
        assert_eq!(levels.first(), Some(&50.0));
        assert_eq!(levels.last(), Some(&210.0));
        assert_eq!(levels.len(), 17);
    }

    #[test]
    fn tiny_threshold_step_is_rejected_not_looped() {
        let mut config = DetectorConfig::default();
        config.threshold_step = 1e-7;
        assert_eq!(config.threshold_levels().len(), MAX_THRESHOLD_LEVELS + 1);
        assert!(matches!(config.validate(), Err(MailbotError::Config(_))));

        config.threshold_step = 1.0;
        assert_eq!(config.threshold_levels().len(), 170);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn ratio_above_one_is_rejected() {
        let mut config = DetectorConfig::default();
        config.circularity.min = 1.5;
        assert!(matches!(config.validate(), Err(MailbotError::Config(_))));
    }

    #[test]
    fn non_positive_area_is_rejected() {
        let mut config = DetectorConfig::default();
        config.area.min = 0.0;
        assert!(matches!(config.validate(), Err(MailbotError::Config(_))));
    }

    #[test]
    fn disabled_filter_accepts_anything() {
        let filter = RangeFilter {
            enabled: false,
            ..RangeFilter::at_least(0.7)
        };
        assert!(filter.accepts(0.1));
        assert!(!RangeFilter::at_least(0.7).accepts(0.69));
        assert!(RangeFilter::at_least(0.7).accepts(0.7));
        assert!(!RangeFilter::between(100.0, 5000.0).accepts(5000.0));
    }

    #[test]
    fn roi_parses_and_checks_bounds() {
        let roi: RegionOfInterest = "350:720,400:900".parse().unwrap();
        assert_eq!(roi, RegionOfInterest::default());
        assert_eq!(roi.width(), 500);
        assert_eq!(roi.height(), 370);
        assert!(roi.check_within(1280, 720).is_ok());
        assert!(matches!(
            roi.check_within(800, 720),
            Err(MailbotError::Bounds { width: 800, height: 720, .. })
        ));
    }

    #[test]
    fn roi_rejects_malformed_and_empty() {
        assert!("350-720,400-900".parse::<RegionOfInterest>().is_err());
        assert!("720:350,400:900".parse::<RegionOfInterest>().is_err());
        assert!("350:720".parse::<RegionOfInterest>().is_err());
    }

    #[test]
    fn reversed_roi_fields_are_config_error() {
        let roi = RegionOfInterest {
            row_start: 700,
            row_end: 350,
            col_start: 400,
            col_end: 900,
        };
        assert_eq!(roi.height(), 0);
        assert!(matches!(roi.validate(), Err(MailbotError::Config(_))));
        assert!(matches!(roi.check_within(1280, 720), Err(MailbotError::Config(_))));
    }

    #[test]
    fn policy_counts_must_differ() {
        assert!(ClassifierPolicy::default().validate().is_ok());
        let policy = ClassifierPolicy {
            arrived_count: 4,
            not_arrived_count: 4,
        };
        assert!(policy.validate().is_err());
    }
}
