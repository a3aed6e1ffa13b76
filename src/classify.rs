use crate::config::ClassifierPolicy;
use crate::models::{Classification, Keypoint};

impl ClassifierPolicy {
    pub fn classify_count(&self, count: usize) -> Classification {
        if count == self.arrived_count {
            Classification::MailArrived
        } else if count == self.not_arrived_count {
            Classification::MailNotArrived
        } else {
            Classification::MailNotDetected
        }
    }

    /// Only the number of keypoints matters, not where they are.
    pub fn classify(&self, keypoints: &[Keypoint]) -> Classification {
        self.classify_count(keypoints.len())
    }
}

/// Classify with the default policy: no keypoints means the mail covers the
/// holes, four means all holes are visible.
pub fn classify(keypoints: &[Keypoint]) -> Classification {
    ClassifierPolicy::default().classify(keypoints)
}
