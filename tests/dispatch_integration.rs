use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use twitter_api_client::dispatch::{
    DispatchConfig, DispatchRequest, HttpTransport, RequestManager, Transport, TransportResponse,
};

type SendLog = Arc<Mutex<Vec<(String, Instant)>>>;
type CompletionLog = Arc<Mutex<Vec<(String, u16)>>>;

/// Transport scripted per url: `(delay, status)` completes after the delay,
/// a missing entry hangs forever. Every attempt is recorded with its time.
#[derive(Clone, Default)]
struct TestTransport {
    sent: SendLog,
    responses: Arc<HashMap<String, (Duration, u16)>>,
}

impl TestTransport {
    fn new(responses: impl IntoIterator<Item = (&'static str, u64, u16)>) -> Self {
        Self {
            sent: Arc::default(),
            responses: Arc::new(
                responses
                    .into_iter()
                    .map(|(url, secs, status)| {
                        (url.to_string(), (Duration::from_secs(secs), status))
                    })
                    .collect(),
            ),
        }
    }

    fn sends(&self) -> Vec<(String, Instant)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for TestTransport {
    fn send(&self, request: &DispatchRequest) -> impl Future<Output = TransportResponse> + Send {
        self.sent
            .lock()
            .unwrap()
            .push((request.url.clone(), Instant::now()));
        let response = self.responses.get(&request.url).copied();
        async move {
            match response {
                Some((delay, status)) => {
                    tokio::time::sleep(delay).await;
                    let status =
                        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    TransportResponse::new(status, "")
                }
                None => std::future::pending().await,
            }
        }
    }
}

fn recording_handler(
    log: &CompletionLog,
) -> impl FnMut(&DispatchRequest, &TransportResponse) + Send + use<> {
    let log = log.clone();
    move |request, response| {
        log.lock()
            .unwrap()
            .push((request.url.clone(), response.status.as_u16()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_request_is_abandoned_after_max_sends() {
    let completed: CompletionLog = Arc::default();
    let transport = TestTransport::default();
    let manager = RequestManager::spawn(
        transport.clone(),
        DispatchConfig::new(1),
        recording_handler(&completed),
    );

    manager.submit(DispatchRequest::new("cb"));
    tokio::time::sleep(Duration::from_secs(200)).await;

    // Exactly three dispatch attempts, each at least a resend interval apart.
    let sends = transport.sends();
    assert_eq!(sends.len(), 3);
    for pair in sends.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(60));
    }
    assert!(completed.lock().unwrap().is_empty());

    // Gone from all internal state.
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.in_flight, 0);
    assert_eq!(snapshot.queued, 0);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_abandonment_frees_the_slot() {
    let transport = TestTransport::default();
    let manager = RequestManager::spawn(transport.clone(), DispatchConfig::new(1), |_, _| {});

    manager.submit(DispatchRequest::new("first"));
    manager.submit(DispatchRequest::new("second"));

    let before = manager.snapshot().await;
    assert_eq!(before.in_flight, 1);
    assert_eq!(before.queued, 1);

    // After "first" is abandoned, "second" takes its slot.
    tokio::time::sleep(Duration::from_secs(200)).await;
    let after = manager.snapshot().await;
    assert_eq!(after.in_flight, 1);
    assert_eq!(after.queued, 0);

    let urls: Vec<String> = transport.sends().into_iter().map(|(url, _)| url).collect();
    assert_eq!(urls, vec!["first", "first", "first", "second"]);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_error_responses_wait_for_the_sweep() {
    let completed: CompletionLog = Arc::default();
    // Completes instantly, but always with a server error.
    let transport = TestTransport::new([("cb", 0, 500)]);
    let manager = RequestManager::spawn(
        transport.clone(),
        DispatchConfig::new(1),
        recording_handler(&completed),
    );

    manager.submit(DispatchRequest::new("cb"));
    tokio::time::sleep(Duration::from_secs(1)).await;

    // The error was delivered but did not trigger an immediate retry.
    assert_eq!(completed.lock().unwrap().clone(), vec![("cb".to_string(), 500)]);
    assert_eq!(transport.sends().len(), 1);
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.in_flight, 1);

    // The sweep resends twice more, then abandons.
    tokio::time::sleep(Duration::from_secs(200)).await;
    assert_eq!(transport.sends().len(), 3);
    assert_eq!(completed.lock().unwrap().len(), 3);
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.in_flight, 0);
    assert_eq!(snapshot.queued, 0);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_completion_promotes_next_queued_request() {
    let completed: CompletionLog = Arc::default();
    // Cap of 2: "a" completes after 5s, "b" and "c" hang.
    let transport = TestTransport::new([("a", 5, 200)]);
    let manager = RequestManager::spawn(
        transport.clone(),
        DispatchConfig::new(2),
        recording_handler(&completed),
    );

    manager.submit(DispatchRequest::new("a"));
    manager.submit(DispatchRequest::new("b"));
    manager.submit(DispatchRequest::new("c"));

    let before = manager.snapshot().await;
    assert_eq!(before.in_flight, 2);
    assert_eq!(before.queued, 1);

    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(completed.lock().unwrap().clone(), vec![("a".to_string(), 200)]);
    let after = manager.snapshot().await;
    assert_eq!(after.in_flight, 2);
    assert_eq!(after.queued, 0);

    let urls: Vec<String> = transport.sends().into_iter().map(|(url, _)| url).collect();
    assert_eq!(urls, vec!["a", "b", "c"]);
    manager.shutdown().await;
}

#[tokio::test]
async fn test_http_transport_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/callback"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let completed: CompletionLog = Arc::default();
    let mut config = DispatchConfig::new(1);
    config.sweep_interval = Duration::from_millis(50);
    config.resend_interval = Duration::from_millis(500);

    let manager = RequestManager::spawn(
        HttpTransport::new(),
        config,
        recording_handler(&completed),
    );
    manager.submit(DispatchRequest::new(format!("{}/callback", server.uri())));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        completed.lock().unwrap().first().map(|(_, status)| *status),
        Some(200)
    );
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.in_flight, 0);
    manager.shutdown().await;
}

#[tokio::test]
async fn test_http_transport_maps_connect_errors_to_generic_failure() {
    // Nothing listens on port 1.
    let transport = HttpTransport::new();
    let response = transport
        .send(&DispatchRequest::new("http://127.0.0.1:1/unreachable"))
        .await;
    assert_eq!(response.status.as_u16(), 599);
}
