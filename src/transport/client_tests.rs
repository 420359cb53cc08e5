//! Tests for [`ReqwestTransport`].
//!
//! Note: These tests focus on unit testing the transport construction
//! and configuration. Integration tests with actual HTTP servers would
//! require a test server setup or would be done manually / in CI with
//! external services.

use super::ReqwestTransport;

mod reqwest_transport {
    use super::*;

    #[test]
    fn new_creates_transport() {
        let transport = ReqwestTransport::new();

        let _ = format!("{transport:?}");
    }

    #[test]
    fn default_creates_same_as_new() {
        let transport1 = ReqwestTransport::new();
        let transport2 = ReqwestTransport::default();

        let _ = format!("{transport1:?}");
        let _ = format!("{transport2:?}");
    }

    #[test]
    fn from_client_accepts_custom_client() {
        let custom = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap();
        let transport = ReqwestTransport::from_client(custom);

        let _ = format!("{transport:?}");
    }

    #[test]
    fn clone_creates_independent_transport() {
        let transport1 = ReqwestTransport::new();
        let transport2 = transport1.clone();

        let _ = format!("{transport1:?}");
        let _ = format!("{transport2:?}");
    }

    #[test]
    fn debug_format_is_readable() {
        let transport = ReqwestTransport::new();
        let debug = format!("{transport:?}");

        assert!(debug.contains("ReqwestTransport"));
    }

    #[test]
    fn transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestTransport>();
    }
}
