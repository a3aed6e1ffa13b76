//! Maps each [`Classification`] to the side effect the caller wants for it.

use crate::models::Classification;

pub type Action = Box<dyn Fn() + Send + Sync>;

/// Dispatch table with one no-argument action per outcome.
pub struct Dispatch {
    mail_arrived: Action,
    mail_not_arrived: Action,
    mail_not_detected: Action,
}

impl Dispatch {
    pub fn new(mail_arrived: Action, mail_not_arrived: Action, mail_not_detected: Action) -> Self {
        Self {
            mail_arrived,
            mail_not_arrived,
            mail_not_detected,
        }
    }

    /// Actions that log the outcome at info level.
    pub fn logging() -> Self {
        Self::new(
            Box::new(|| log::info!("Mail Arrived!")),
            Box::new(|| log::info!("Mail has not arrived.")),
            Box::new(|| log::info!("Can't detect mail.")),
        )
    }

    pub fn on(mut self, classification: Classification, action: Action) -> Self {
        match classification {
            Classification::MailArrived => self.mail_arrived = action,
            Classification::MailNotArrived => self.mail_not_arrived = action,
            Classification::MailNotDetected => self.mail_not_detected = action,
        }
        self
    }

    pub fn dispatch(&self, classification: Classification) {
        log::debug!("dispatching {}", classification.action_name());
        match classification {
            Classification::MailArrived => (self.mail_arrived)(),
            Classification::MailNotArrived => (self.mail_not_arrived)(),
            Classification::MailNotDetected => (self.mail_not_detected)(),
        }
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::logging()
    }
}
