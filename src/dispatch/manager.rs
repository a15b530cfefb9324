//! The bounded-concurrency request manager.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default interval after which an unanswered dispatch is sent again.
pub const DEFAULT_RESEND_INTERVAL: Duration = Duration::from_secs(60);
/// Default maximum number of dispatch attempts before abandonment.
pub const DEFAULT_MAX_SENDS: u32 = 3;
/// Default interval between sweeps of the in-flight set.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Fixed configuration for a [`RequestManager`].
///
/// All knobs apply to every request; none are per-request.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of requests in flight at once.
    pub max_in_flight: usize,
    /// How long a dispatch may stay unanswered before the sweep resends it.
    pub resend_interval: Duration,
    /// Total dispatch attempts before a request is abandoned.
    pub max_sends: u32,
    /// How often the in-flight set is swept.
    pub sweep_interval: Duration,
}

impl DispatchConfig {
    /// Configuration with the given concurrency cap and default timing.
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight,
            resend_interval: DEFAULT_RESEND_INTERVAL,
            max_sends: DEFAULT_MAX_SENDS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Identifier assigned to a request at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// An opaque request descriptor: a target plus caller metadata.
///
/// The manager never interprets the contents; only the transport does.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Target URL.
    pub url: String,
    /// Caller-defined metadata, passed through untouched.
    pub metadata: HashMap<String, String>,
}

impl DispatchRequest {
    /// A request for the given target.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The response a transport produced for one dispatch attempt.
///
/// Transport-level failures are represented as a synthetic error status so
/// the manager's policy stays count-and-time only, never cause-inspecting.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status of the attempt.
    pub status: StatusCode,
    /// Response body, possibly empty.
    pub body: String,
}

impl TransportResponse {
    /// A response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Delivers a [`DispatchRequest`] and resolves to its response.
///
/// Implementations must always resolve to a [`TransportResponse`]; failures
/// that never produced a response map to a synthetic error status (see
/// [`HttpTransport`](crate::dispatch::HttpTransport)).
pub trait Transport: Send + Sync + 'static {
    /// Deliver the request and resolve to its response.
    fn send(&self, request: &DispatchRequest) -> impl Future<Output = TransportResponse> + Send;
}

/// Counts of the manager's internal state, for observability and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    /// Requests currently in flight.
    pub in_flight: usize,
    /// Requests waiting for a free slot.
    pub queued: usize,
}

enum Command {
    Submit(RequestId, DispatchRequest),
    Snapshot(oneshot::Sender<DispatchSnapshot>),
}

struct Completion {
    id: RequestId,
    response: TransportResponse,
}

/// Handle to a running request manager task.
///
/// All state lives in a single task; submissions, transport completions and
/// the periodic sweep are multiplexed onto it, so no request bookkeeping is
/// ever touched from two tasks. Dropping the handle (or calling
/// [`shutdown`](RequestManager::shutdown)) stops the task; in-flight work is
/// not awaited.
pub struct RequestManager {
    commands: mpsc::UnboundedSender<Command>,
    next_id: AtomicU64,
    task: JoinHandle<()>,
}

impl RequestManager {
    /// Start a manager over the given transport.
    ///
    /// `on_complete` is invoked on the manager task for every response a
    /// dispatch attempt produces, successful or not; whether the request is
    /// then removed or retried is the manager's decision alone.
    pub fn spawn<T, F>(transport: T, config: DispatchConfig, on_complete: F) -> Self
    where
        T: Transport,
        F: FnMut(&DispatchRequest, &TransportResponse) + Send + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let task = ManagerTask {
            transport: Arc::new(transport),
            config,
            on_complete,
            pending: Vec::new(),
            in_flight: HashMap::new(),
            completions_tx,
        };
        let task = tokio::spawn(task.run(commands_rx, completions_rx));

        Self {
            commands: commands_tx,
            next_id: AtomicU64::new(0),
            task,
        }
    }

    /// Queue a request for dispatch.
    ///
    /// The request is promoted into flight immediately if a slot is free,
    /// otherwise it waits; waiting requests are promoted most-recent first.
    pub fn submit(&self, request: DispatchRequest) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if self.commands.send(Command::Submit(id, request)).is_err() {
            warn!("request manager task is gone, dropping submission");
        }
        id
    }

    /// Current queue and in-flight counts.
    pub async fn snapshot(&self) -> DispatchSnapshot {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(Command::Snapshot(reply_tx)).is_err() {
            return DispatchSnapshot::default();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Stop the manager task.
    pub async fn shutdown(self) {
        drop(self.commands);
        let _ = self.task.await;
    }
}

struct ManagerTask<T, F> {
    transport: Arc<T>,
    config: DispatchConfig,
    on_complete: F,
    /// Wait queue; promotion pops from the back.
    pending: Vec<(RequestId, DispatchRequest)>,
    in_flight: HashMap<RequestId, InFlight>,
    completions_tx: mpsc::UnboundedSender<Completion>,
}

struct InFlight {
    request: DispatchRequest,
    send_count: u32,
    last_send: Instant,
}

impl<T, F> ManagerTask<T, F>
where
    T: Transport,
    F: FnMut(&DispatchRequest, &TransportResponse) + Send + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let mut sweep = tokio::time::interval(self.config.sweep_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sweep.tick() => {
                    self.sweep();
                    self.promote();
                }
                command = commands.recv() => match command {
                    Some(Command::Submit(id, request)) => {
                        self.pending.push((id, request));
                        self.promote();
                    }
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    None => break,
                },
                Some(completion) = completions.recv() => self.on_completion(completion),
            }
        }
    }

    fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            in_flight: self.in_flight.len(),
            queued: self.pending.len(),
        }
    }

    /// Fill free slots from the wait queue, most recent submission first.
    fn promote(&mut self) {
        while self.in_flight.len() < self.config.max_in_flight {
            let Some((id, request)) = self.pending.pop() else {
                break;
            };
            self.in_flight.insert(
                id,
                InFlight {
                    request,
                    send_count: 0,
                    last_send: Instant::now(),
                },
            );
            self.dispatch(id);
        }
    }

    /// Resend or abandon every in-flight request whose last dispatch has
    /// gone unanswered past the resend interval.
    fn sweep(&mut self) {
        let now = Instant::now();
        let expired: Vec<RequestId> = self
            .in_flight
            .iter()
            .filter(|(_, entry)| entry.last_send + self.config.resend_interval < now)
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            let Some(entry) = self.in_flight.get(&id) else {
                continue;
            };
            if entry.send_count >= self.config.max_sends {
                if let Some(entry) = self.in_flight.remove(&id) {
                    info!(
                        url = %entry.request.url,
                        sends = entry.send_count,
                        "request expired - too many retries"
                    );
                }
            } else {
                info!(url = %entry.request.url, "retrying request");
                self.dispatch(id);
            }
        }
    }

    /// Issue one dispatch attempt for an in-flight request.
    fn dispatch(&mut self, id: RequestId) {
        let Some(entry) = self.in_flight.get_mut(&id) else {
            return;
        };
        entry.send_count += 1;
        entry.last_send = Instant::now();

        let request = entry.request.clone();
        let transport = Arc::clone(&self.transport);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let response = transport.send(&request).await;
            let _ = completions.send(Completion { id, response });
        });
    }

    fn on_completion(&mut self, completion: Completion) {
        let Some(entry) = self.in_flight.get(&completion.id) else {
            // Late response for a request already completed or abandoned.
            debug!(status = completion.response.status.as_u16(), "stale completion");
            return;
        };

        debug!(
            url = %entry.request.url,
            status = completion.response.status.as_u16(),
            "completed request"
        );
        (self.on_complete)(&entry.request, &completion.response);

        // Error statuses are left in flight; the next sweep decides whether
        // to resend or abandon.
        if completion.response.status.as_u16() < 400 {
            self.in_flight.remove(&completion.id);
            self.promote();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Transport that records each attempt and completes only the urls given
    /// a delay; everything else hangs forever.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        sent: Arc<Mutex<Vec<String>>>,
        delays: Arc<HashMap<String, Duration>>,
    }

    impl ScriptedTransport {
        fn completing(delays: impl IntoIterator<Item = (&'static str, u64)>) -> Self {
            Self {
                sent: Arc::default(),
                delays: Arc::new(
                    delays
                        .into_iter()
                        .map(|(url, secs)| (url.to_string(), Duration::from_secs(secs)))
                        .collect(),
                ),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &DispatchRequest) -> impl Future<Output = TransportResponse> + Send {
            self.sent.lock().unwrap().push(request.url.clone());
            let delay = self.delays.get(&request.url).copied();
            async move {
                match delay {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        TransportResponse::new(StatusCode::OK, "")
                    }
                    None => std::future::pending().await,
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_excess_submissions_stay_queued() {
        let transport = ScriptedTransport::default();
        let manager = RequestManager::spawn(transport, DispatchConfig::new(2), |_, _| {});

        manager.submit(DispatchRequest::new("a"));
        manager.submit(DispatchRequest::new("b"));
        manager.submit(DispatchRequest::new("c"));

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.in_flight, 2);
        assert_eq!(snapshot.queued, 1);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_promotion_is_lifo() {
        // "a" completes after 10s; "b" and "c" queue behind it on a cap of 1.
        let transport = ScriptedTransport::completing([("a", 10)]);
        let manager = RequestManager::spawn(transport.clone(), DispatchConfig::new(1), |_, _| {});

        manager.submit(DispatchRequest::new("a"));
        manager.submit(DispatchRequest::new("b"));
        manager.submit(DispatchRequest::new("c"));

        tokio::time::sleep(Duration::from_secs(11)).await;

        // The freed slot goes to the most recent submission.
        assert_eq!(transport.sent(), vec!["a", "c"]);
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.in_flight, 1);
        assert_eq!(snapshot.queued, 1);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_passthrough() {
        let completed: Arc<Mutex<Vec<String>>> = Arc::default();
        let seen = completed.clone();
        let transport = ScriptedTransport::completing([("a", 1)]);
        let manager = RequestManager::spawn(
            transport,
            DispatchConfig::new(1),
            move |request, _| {
                let tag = request.metadata.get("tag").cloned().unwrap_or_default();
                seen.lock().unwrap().push(tag);
            },
        );

        manager.submit(DispatchRequest::new("a").with_metadata("tag", "callback-7"));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(completed.lock().unwrap().clone(), vec!["callback-7"]);
        manager.shutdown().await;
    }
}
