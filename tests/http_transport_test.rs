use paynotify::application::dispatcher::NotificationDispatcher;
use paynotify::application::recorder::PaymentRecorder;
use paynotify::application::workflow::PaymentWorkflow;
use paynotify::domain::notification::{DispatchFailure, TransportError};
use paynotify::domain::outcome::{DISPATCH_WARNING_NOTICE, WorkflowError};
use paynotify::domain::payment::PaymentRequest;
use paynotify::domain::ports::NotificationTransport;
use paynotify::infrastructure::http::HttpTransport;
use paynotify::infrastructure::in_memory::InMemoryPaymentStore;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notify_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api/EnviarEmail", server.uri())).unwrap()
}

fn workflow(store: InMemoryPaymentStore, url: Url, timeout: Duration) -> PaymentWorkflow {
    let store = Arc::new(store);
    let transport = HttpTransport::new(timeout).unwrap();
    PaymentWorkflow::new(
        PaymentRecorder::new(store.clone()),
        NotificationDispatcher::new(store, Arc::new(transport), url).with_timeout(timeout),
    )
}

#[tokio::test]
async fn test_post_json_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/EnviarEmail"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "sent", "date": "2024-05-01T12:30:00Z"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
    let response = transport
        .post_json(&notify_url(&server), &json!({"paymentId": 1}))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.unwrap().contains("sent"));
}

#[tokio::test]
async fn test_post_json_empty_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
    let response = transport
        .post_json(&notify_url(&server), &json!({}))
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert_eq!(response.body, None);
}

#[tokio::test]
async fn test_post_json_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(Duration::from_millis(50)).unwrap();
    let err = transport
        .post_json(&notify_url(&server), &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::Timeout);
}

#[tokio::test]
async fn test_post_json_connection_refused() {
    // Bind and drop a listener to get a local port nobody is serving.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
    let url = Url::parse(&format!("http://127.0.0.1:{port}/notify")).unwrap();
    let err = transport.post_json(&url, &json!({})).await.unwrap_err();

    assert!(matches!(err, TransportError::Connect(_)), "got {err:?}");
}

#[tokio::test]
async fn test_workflow_posts_payment_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/EnviarEmail"))
        .and(body_partial_json(json!({
            "paymentId": 101,
            "userId": 7,
            "itemId": 42,
            "quantity": 1
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"mensagem": "Email enviado", "data": "2024-05-01T12:30:00"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let workflow = workflow(
        InMemoryPaymentStore::starting_at(101),
        notify_url(&server),
        Duration::from_secs(2),
    );
    let result = workflow
        .complete(PaymentRequest::new(7, 42, dec!(19.99), 1))
        .await;

    assert_eq!(result.payload().map(|p| p.id), Some(101));
    assert!(result.notices().is_empty());
}

#[tokio::test]
async fn test_workflow_warns_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let workflow = workflow(
        InMemoryPaymentStore::starting_at(102),
        notify_url(&server),
        Duration::from_secs(2),
    );
    let result = workflow
        .complete(PaymentRequest::new(7, 42, dec!(19.99), 1))
        .await;

    assert_eq!(result.payload().map(|p| p.id), Some(102));
    assert_eq!(result.notices(), [DISPATCH_WARNING_NOTICE]);
}

#[tokio::test]
async fn test_workflow_slow_endpoint_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let workflow = workflow(
        InMemoryPaymentStore::new(),
        notify_url(&server),
        Duration::from_millis(50),
    );
    let result = workflow
        .complete(PaymentRequest::new(7, 42, dec!(19.99), 1))
        .await;

    assert!(result.is_degraded());
    assert_eq!(
        result.failures(),
        [WorkflowError::Dispatch(DispatchFailure::Transport(
            TransportError::Timeout
        ))]
    );
}

/// Serves one connection: answers with `status_line`, announces a 100 byte
/// body, sends a fragment of it and hangs up.
async fn truncated_body_server(status_line: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{{\"mes"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    Url::parse(&format!("http://{addr}/notify")).unwrap()
}

async fn read_request(socket: &mut TcpStream) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&request);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if request.len() >= end + 4 + content_length {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_post_json_truncated_body_keeps_status() {
    let url = truncated_body_server("HTTP/1.1 200 OK").await;

    let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
    let response = transport.post_json(&url, &json!({"paymentId": 1})).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, None);
}

#[tokio::test]
async fn test_workflow_truncated_success_body_is_delivered() {
    let url = truncated_body_server("HTTP/1.1 200 OK").await;

    let workflow = workflow(InMemoryPaymentStore::new(), url, Duration::from_secs(2));
    let result = workflow
        .complete(PaymentRequest::new(7, 42, dec!(19.99), 1))
        .await;

    assert_eq!(result.payload().map(|p| p.id), Some(1));
    assert!(result.is_success(), "notices: {:?}", result.notices());
}

#[tokio::test]
async fn test_workflow_truncated_error_body_is_rejected() {
    let url = truncated_body_server("HTTP/1.1 500 Internal Server Error").await;

    let workflow = workflow(InMemoryPaymentStore::new(), url, Duration::from_secs(2));
    let result = workflow
        .complete(PaymentRequest::new(7, 42, dec!(19.99), 1))
        .await;

    assert_eq!(result.payload().map(|p| p.id), Some(1));
    assert_eq!(result.notices(), [DISPATCH_WARNING_NOTICE]);
    assert_eq!(
        result.failures(),
        [WorkflowError::Dispatch(DispatchFailure::Rejected { status: 500 })]
    );
}
