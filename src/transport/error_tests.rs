//! Tests for transport error types.

use super::{AttemptFailure, Error};
use std::error::Error as _;

mod display {
    use super::*;

    #[test]
    fn connection_error_displays_source() {
        let error = Error::Connection(Box::new(std::io::Error::other("refused")));

        assert!(error.to_string().contains("connection error"));
        assert!(error.to_string().contains("refused"));
    }

    #[test]
    fn timeout_mentions_timing_out() {
        assert!(Error::Timeout.to_string().contains("timed out"));
    }

    #[test]
    fn retries_exhausted_displays_attempt_count() {
        let error = Error::RetriesExhausted {
            attempts: 4,
            last_failure: AttemptFailure::Status(http::StatusCode::BAD_GATEWAY),
        };

        assert!(error.to_string().contains("4 attempts"));
    }

    #[test]
    fn attempt_failure_status_displays_code() {
        let failure = AttemptFailure::Status(http::StatusCode::SERVICE_UNAVAILABLE);

        assert!(failure.to_string().contains("503"));
    }

    #[test]
    fn attempt_failure_transport_is_transparent() {
        let failure = AttemptFailure::Transport(Box::new(Error::Timeout));

        assert_eq!(failure.to_string(), Error::Timeout.to_string());
    }

    #[test]
    fn body_errors_name_the_failed_step() {
        let drain = Error::BodyDrain(std::io::Error::other("reset"));
        let close = Error::BodyClose(std::io::Error::other("stuck"));
        let replay = Error::BodyReplay(std::io::Error::other("gone"));

        assert!(drain.to_string().contains("discard"));
        assert!(close.to_string().contains("close"));
        assert!(replay.to_string().contains("replayable"));
    }
}

mod source_chain {
    use super::*;

    #[test]
    fn retries_exhausted_exposes_last_failure_as_source() {
        let error = Error::RetriesExhausted {
            attempts: 3,
            last_failure: AttemptFailure::Transport(Box::new(Error::Timeout)),
        };

        let source = error.source().expect("exhausted error has a source");
        assert!(source.to_string().contains("timed out"));
    }

    #[test]
    fn body_drain_wraps_the_io_error() {
        let error = Error::BodyDrain(std::io::Error::other("reset"));

        assert!(error.source().is_some());
    }

    #[test]
    fn deadline_elapsed_has_no_source() {
        assert!(Error::DeadlineElapsed.source().is_none());
    }
}

mod helpers {
    use super::*;

    #[test]
    fn is_retries_exhausted_matches_only_the_marker() {
        let exhausted = Error::RetriesExhausted {
            attempts: 2,
            last_failure: AttemptFailure::Status(http::StatusCode::INTERNAL_SERVER_ERROR),
        };

        assert!(exhausted.is_retries_exhausted());
        assert!(!Error::Timeout.is_retries_exhausted());
        assert!(!Error::DeadlineElapsed.is_retries_exhausted());
    }

    #[test]
    fn last_status_reports_the_final_status_code() {
        let exhausted = Error::RetriesExhausted {
            attempts: 2,
            last_failure: AttemptFailure::Status(http::StatusCode::SERVICE_UNAVAILABLE),
        };

        assert_eq!(
            exhausted.last_status(),
            Some(http::StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[test]
    fn last_status_is_none_for_transport_failures() {
        let exhausted = Error::RetriesExhausted {
            attempts: 2,
            last_failure: AttemptFailure::Transport(Box::new(Error::Timeout)),
        };

        assert_eq!(exhausted.last_status(), None);
        assert_eq!(Error::Timeout.last_status(), None);
    }

    #[test]
    fn attempt_failure_status_helper() {
        let status = AttemptFailure::Status(http::StatusCode::BAD_GATEWAY);
        let transport = AttemptFailure::Transport(Box::new(Error::Timeout));

        assert_eq!(status.status(), Some(http::StatusCode::BAD_GATEWAY));
        assert_eq!(transport.status(), None);
    }
}
