use std::time::Duration;

use thiserror::Error;
use tonic::Status;

use crate::admission::Ticket;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The ticket was never issued or its holder already left.
    #[error("client not found: ticket {0}")]
    NotFound(Ticket),

    #[error("client {name} gave up after waiting {}ms for a seat", .waited.as_millis())]
    TimedOut { name: String, waited: Duration },
}

impl From<AdmissionError> for Status {
    fn from(err: AdmissionError) -> Self {
        match &err {
            AdmissionError::NotFound(_) => Status::not_found(err.to_string()),
            AdmissionError::TimedOut { .. } => Status::deadline_exceeded(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn not_found_maps_to_not_found_status() {
        let status = Status::from(AdmissionError::NotFound(Ticket::new(7)));
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "client not found: ticket 7");
    }

    #[test]
    fn timeout_maps_to_deadline_exceeded() {
        let err = AdmissionError::TimedOut {
            name: "nigiri".to_string(),
            waited: Duration::from_millis(1500),
        };
        let status = Status::from(err);
        assert_eq!(status.code(), Code::DeadlineExceeded);
        assert_eq!(status.message(), "client nigiri gave up after waiting 1500ms for a seat");
    }
}
