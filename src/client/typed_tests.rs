//! Tests for the typed [`Client`].

use super::typed::{Client, ClientError, ErrorResponse};
use crate::transport::{
    Error, HttpRequest, HttpResponse, ResponseBody, Transport,
};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Item {
    id: u64,
    name: String,
}

/// Mock transport returning queued outcomes and capturing request
/// metadata.
#[derive(Debug)]
struct MockTransport {
    responses: Mutex<Vec<Result<HttpResponse, Error>>>,
    requests: Mutex<Vec<(http::Method, String, bool)>>,
}

impl MockTransport {
    fn new(responses: Vec<Result<HttpResponse, Error>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn ok(status: u16, body: &str) -> Self {
        Self::new(vec![Ok(HttpResponse::new(
            http::StatusCode::from_u16(status).unwrap(),
            http::HeaderMap::new(),
            ResponseBody::from_bytes(body.to_string()),
        ))])
    }

    fn captured(&self) -> Vec<(http::Method, String, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for Arc<MockTransport> {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().unwrap().push((
            req.method.clone(),
            req.url.to_string(),
            req.deadline.is_some(),
        ));
        self.responses.lock().unwrap().remove(0)
    }
}

/// Transport that never completes, for timeout tests.
#[derive(Debug)]
struct PendingTransport;

impl Transport for PendingTransport {
    async fn send(&self, _req: HttpRequest) -> Result<HttpResponse, Error> {
        std::future::pending().await
    }
}

fn client(transport: Arc<MockTransport>) -> Client<Arc<MockTransport>> {
    Client::with_transport(transport, Duration::from_secs(5))
}

mod decoding {
    use super::*;

    #[tokio::test]
    async fn decodes_json_into_the_requested_type() {
        let transport = Arc::new(MockTransport::ok(200, r#"{"id":1,"name":"widget"}"#));

        let response = client(transport)
            .get::<Item>("https://example.com/items/1")
            .await
            .unwrap();

        assert_eq!(
            response.data,
            Item {
                id: 1,
                name: "widget".to_string()
            }
        );
        assert_eq!(response.status, http::StatusCode::OK);
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn preserves_raw_body_and_headers() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        let transport = Arc::new(MockTransport::new(vec![Ok(HttpResponse::new(
            http::StatusCode::OK,
            headers,
            ResponseBody::from_bytes(r#"{"id":2,"name":"gadget"}"#),
        ))]));

        let response = client(transport)
            .get::<Item>("https://example.com/items/2")
            .await
            .unwrap();

        assert_eq!(response.body_text().unwrap(), r#"{"id":2,"name":"gadget"}"#);
        assert_eq!(
            response.headers.get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn empty_body_decodes_as_json_null() {
        let transport = Arc::new(MockTransport::ok(204, ""));

        let response = client(transport)
            .get::<Option<Item>>("https://example.com/items/9")
            .await
            .unwrap();

        assert_eq!(response.data, None);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let transport = Arc::new(MockTransport::ok(200, "not json"));

        let err = client(transport)
            .get::<Item>("https://example.com/items/1")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)));
    }
}

mod api_errors {
    use super::*;

    #[tokio::test]
    async fn json_error_payload_is_deserialized() {
        let transport = Arc::new(MockTransport::ok(
            404,
            r#"{"message":"item not found","details":"id 7 does not exist"}"#,
        ));

        let err = client(transport)
            .get::<Item>("https://example.com/items/7")
            .await
            .unwrap_err();

        match err {
            ClientError::Api(resp) => {
                assert_eq!(resp.message.as_deref(), Some("item not found"));
                assert_eq!(resp.details.as_deref(), Some("id 7 does not exist"));
                assert_eq!(resp.status_code, 404);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_becomes_the_message() {
        let transport = Arc::new(MockTransport::ok(400, "plain text failure"));

        let err = client(transport)
            .get::<Item>("https://example.com/items")
            .await
            .unwrap_err();

        match err {
            ClientError::Api(resp) => {
                assert_eq!(resp.message.as_deref(), Some("plain text failure"));
                assert_eq!(resp.status_code, 400);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_error_body_falls_back_to_status_text() {
        let transport = Arc::new(MockTransport::ok(404, ""));

        let err = client(transport)
            .get::<Item>("https://example.com/items/0")
            .await
            .unwrap_err();

        match err {
            ClientError::Api(resp) => {
                assert_eq!(resp.message.as_deref(), Some("Not Found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn payload_status_code_wins_over_the_response_status() {
        let transport = Arc::new(MockTransport::ok(
            400,
            r#"{"message":"bad input","statusCode":422}"#,
        ));

        let err = client(transport)
            .get::<Item>("https://example.com/items")
            .await
            .unwrap_err();

        match err {
            ClientError::Api(resp) => assert_eq!(resp.status_code, 422),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn error_response_display_includes_status_and_message() {
        let resp = ErrorResponse::from_parts(http::StatusCode::BAD_GATEWAY, b"upstream died");

        let display = resp.to_string();
        assert!(display.contains("502"));
        assert!(display.contains("upstream died"));
    }

    #[test]
    fn error_response_display_falls_back_to_error_field() {
        let resp =
            ErrorResponse::from_parts(http::StatusCode::BAD_REQUEST, br#"{"error":"oops"}"#);

        assert!(resp.to_string().contains("oops"));
    }
}

mod conveniences {
    use super::*;

    #[tokio::test]
    async fn get_issues_a_get_request() {
        let transport = Arc::new(MockTransport::ok(200, "null"));

        client(transport.clone())
            .get::<Option<Item>>("https://example.com/items")
            .await
            .unwrap();

        let captured = transport.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0, http::Method::GET);
        assert_eq!(captured[0].1, "https://example.com/items");
    }

    #[tokio::test]
    async fn post_issues_a_post_request() {
        let transport = Arc::new(MockTransport::ok(200, "null"));

        client(transport.clone())
            .post::<Option<Item>>("https://example.com/items", r#"{"name":"new"}"#)
            .await
            .unwrap();

        assert_eq!(transport.captured()[0].0, http::Method::POST);
    }

    #[tokio::test]
    async fn put_patch_delete_use_their_methods() {
        for (method, expected) in [
            ("put", http::Method::PUT),
            ("patch", http::Method::PATCH),
            ("delete", http::Method::DELETE),
        ] {
            let transport = Arc::new(MockTransport::ok(200, "null"));
            let client = client(transport.clone());

            match method {
                "put" => client
                    .put::<Option<Item>>("https://example.com/items/1", "{}")
                    .await
                    .map(drop)
                    .unwrap(),
                "patch" => client
                    .patch::<Option<Item>>("https://example.com/items/1", "{}")
                    .await
                    .map(drop)
                    .unwrap(),
                _ => client
                    .delete::<Option<Item>>("https://example.com/items/1")
                    .await
                    .map(drop)
                    .unwrap(),
            }

            assert_eq!(transport.captured()[0].0, expected);
        }
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_sending() {
        let transport = Arc::new(MockTransport::ok(200, "null"));

        let err = client(transport.clone())
            .get::<Option<Item>>("not a url")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert!(transport.captured().is_empty());
    }
}

mod timeouts {
    use super::*;

    #[tokio::test]
    async fn requests_are_stamped_with_a_deadline() {
        let transport = Arc::new(MockTransport::ok(200, "null"));

        client(transport.clone())
            .get::<Option<Item>>("https://example.com/items")
            .await
            .unwrap();

        assert!(transport.captured()[0].2, "deadline should be set");
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout_bounds_the_whole_request() {
        let client = Client::with_transport(PendingTransport, Duration::from_secs(5));

        let before = tokio::time::Instant::now();
        let err = client
            .execute_raw(HttpRequest::get(
                url::Url::parse("https://example.com/slow").unwrap(),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DeadlineElapsed));
        assert_eq!(before.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn caller_deadline_is_not_overwritten() {
        let transport = Arc::new(MockTransport::ok(200, "null"));
        let client = client(transport.clone());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
        let request = HttpRequest::get(url::Url::parse("https://example.com/items").unwrap())
            .with_deadline(deadline);
        client.execute_raw(request).await.unwrap().body.close().unwrap();

        assert!(transport.captured()[0].2);
    }
}

mod transport_errors {
    use super::*;

    #[tokio::test]
    async fn transport_failures_pass_through() {
        let transport = Arc::new(MockTransport::new(vec![Err(Error::Timeout)]));

        let err = client(transport)
            .get::<Option<Item>>("https://example.com/items")
            .await
            .unwrap_err();

        match err {
            ClientError::Transport(inner) => assert!(inner.is_timeout()),
            other => panic!("expected Transport error, got {other:?}"),
        }
    }
}
