use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use std::borrow::Cow;
use std::time::Duration;
use tagscope_http::{HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_bytes_sends_headers_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tags/web_info/"))
        .and(query_param("tag_name", "kitten"))
        .and(header("x-ig-app-id", "936619743392459"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert("x-ig-app-id", HeaderValue::from_static("936619743392459"));

    let body = client
        .get_bytes(
            "api/v1/tags/web_info/",
            RequestOpts {
                headers: Some(headers),
                query: Some(vec![("tag_name", Cow::Borrowed("kitten"))]),
                ..Default::default()
            },
        )
        .await
        .expect("successful fetch");

    assert_eq!(&body[..], br#"{"ok":true}"#);
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("x-request-id", "req-42")
                .set_body_string(r#"{"message":"login_required","status":"fail"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_bytes("anything", RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api {
            status,
            message,
            request_id,
        } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "login_required");
            assert_eq!(request_id, "req-42");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_bytes("flaky", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HttpError::Api { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
    ));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_millis(50));
    let err = client
        .get_bytes("slow", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(50)));
}

#[tokio::test]
async fn absolute_paths_bypass_base_when_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_string("here"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new("https://unused.invalid").unwrap();
    let body = client
        .get_bytes(
            &format!("{}/elsewhere", server.uri()),
            RequestOpts {
                allow_absolute: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(&body[..], b"here");
}
