use super::*;
use crate::alert::{Severity, Status};
use crate::config::{BackendConfig, TelemetryConfig};
use crate::error::TelemetryError;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Scripted transport that records every network call
#[derive(Default)]
struct MockTransport {
    healthy: AtomicBool,
    reject_deliveries: AtomicBool,
    health_delay: Mutex<Option<Duration>>,
    delivery_delay: Mutex<Option<Duration>>,
    health_calls: AtomicUsize,
    delivery_calls: AtomicUsize,
    delivered: Mutex<Vec<TelemetryEvent>>,
}

impl MockTransport {
    fn healthy() -> Arc<Self> {
        let mock = Self::default();
        mock.healthy.store(true, Ordering::SeqCst);
        Arc::new(mock)
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    fn delivery_calls(&self) -> usize {
        self.delivery_calls.load(Ordering::SeqCst)
    }

    fn network_calls(&self) -> usize {
        self.health_calls() + self.delivery_calls()
    }
}

#[async_trait]
impl TelemetryTransport for MockTransport {
    async fn health(&self) -> Result<(), TelemetryError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.health_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TelemetryError::Probe {
                details: "connection refused".to_string(),
            })
        }
    }

    async fn deliver(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.delivery_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delivery_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_deliveries.load(Ordering::SeqCst) {
            return Err(TelemetryError::Delivery {
                event_type: event.event_type(),
                details: "status 500".to_string(),
            });
        }
        self.delivered.lock().push(event.clone());
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "mock://backend"
    }
}

fn test_config() -> TelemetryConfig {
    TelemetryConfig {
        idle_interval_ms: 20,
        shutdown_wait_ms: 500,
        ..TelemetryConfig::default()
    }
}

fn data(status: Status) -> DataEvent {
    DataEvent::new(status.severity(), status.as_str())
}

async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test(start_paused = true)]
async fn test_probe_cooldown_scenario() {
    let transport = MockTransport::unreachable();
    let dispatcher = TelemetryDispatcher::new(test_config(), transport.clone()).unwrap();

    // t = 0: probe fails
    let result = dispatcher.enqueue_data(data(Status::Normal)).await;
    assert_eq!(result, Err(TelemetryError::Disconnected));
    assert_eq!(transport.health_calls(), 1);

    // t = 10s: inside the cooldown, no network call at all
    tokio::time::advance(Duration::from_secs(10)).await;
    let before = transport.network_calls();
    let result = dispatcher
        .enqueue_alert(AlertEvent::new("drowsiness_detected", Severity::High))
        .await;
    assert_eq!(result, Err(TelemetryError::Disconnected));
    assert_eq!(transport.network_calls(), before);

    // t = 31s: a fresh probe, which now succeeds
    tokio::time::advance(Duration::from_secs(21)).await;
    transport.healthy.store(true, Ordering::SeqCst);
    assert!(dispatcher.enqueue_data(data(Status::Yawning)).await.is_ok());
    assert_eq!(transport.health_calls(), 2);
    assert!(dispatcher.is_connected());

    let stats = dispatcher.stats();
    assert_eq!(stats.probes, 2);
    assert_eq!(stats.probe_failures, 1);
    assert_eq!(stats.rejected_disconnected, 2);
    assert_eq!(stats.data_enqueued, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_submission_leaves_queues_untouched() {
    let transport = MockTransport::unreachable();
    let dispatcher = TelemetryDispatcher::new(test_config(), transport.clone()).unwrap();

    assert!(dispatcher.enqueue_data(data(Status::Drowsy)).await.is_err());
    assert!(dispatcher.enqueue_data(data(Status::Drowsy)).await.is_err());
    assert_eq!(dispatcher.pending(), (0, 0));
    assert_eq!(transport.health_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_bounded_by_probe_timeout() {
    let transport = MockTransport::healthy();
    *transport.health_delay.lock() = Some(Duration::from_secs(3600));
    let config = TelemetryConfig {
        probe_timeout_ms: 300,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();

    let started = Instant::now();
    let result = dispatcher.enqueue_data(data(Status::Normal)).await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(TelemetryError::Disconnected));
    assert!(elapsed < Duration::from_millis(310), "took {:?}", elapsed);
    assert!(!dispatcher.is_connected());
    assert_eq!(dispatcher.stats().probe_failures, 1);
}

#[tokio::test]
async fn test_full_queue_rejects_third_event() {
    let transport = MockTransport::healthy();
    let config = TelemetryConfig {
        data_queue_capacity: 2,
        ..test_config()
    };
    // Worker never started
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();

    assert!(dispatcher.enqueue_data(data(Status::Normal)).await.is_ok());
    assert!(dispatcher.enqueue_data(data(Status::HeadTilt)).await.is_ok());
    assert_eq!(
        dispatcher.enqueue_data(data(Status::Drowsy)).await,
        Err(TelemetryError::QueueFull {
            queue: "data",
            capacity: 2
        })
    );
    assert_eq!(dispatcher.pending(), (2, 0));

    // The alert queue is bounded independently
    assert!(dispatcher
        .enqueue_alert(AlertEvent::new("yawning_detected", Severity::Medium))
        .await
        .is_ok());
    assert_eq!(dispatcher.pending(), (2, 1));
    assert_eq!(dispatcher.stats().dropped_full, 1);
    assert_eq!(transport.delivery_calls(), 0);
}

#[tokio::test]
async fn test_full_queue_accepts_again_after_delivery() {
    let transport = MockTransport::healthy();
    let config = TelemetryConfig {
        data_queue_capacity: 1,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();

    dispatcher.enqueue_data(data(Status::Normal)).await.unwrap();
    assert!(matches!(
        dispatcher.enqueue_data(data(Status::Yawning)).await,
        Err(TelemetryError::QueueFull { .. })
    ));

    dispatcher.start();
    assert!(wait_until(|| transport.delivered.lock().len() == 1).await);
    assert!(dispatcher.enqueue_data(data(Status::Drowsy)).await.is_ok());

    assert!(dispatcher.shutdown().await);
    assert_eq!(dispatcher.stats().dropped_full, 1);
}

#[test]
fn test_dispatcher_rejects_invalid_config() {
    let zero_capacity = TelemetryConfig {
        alert_queue_capacity: 0,
        ..test_config()
    };
    let result = TelemetryDispatcher::new(zero_capacity, MockTransport::healthy());
    assert!(matches!(result, Err(TelemetryError::InvalidConfig { .. })));

    let slow_probe = TelemetryConfig {
        probe_timeout_ms: 5000,
        ..test_config()
    };
    let result = TelemetryDispatcher::new(slow_probe, MockTransport::healthy());
    assert!(matches!(result, Err(TelemetryError::InvalidConfig { .. })));
}

#[tokio::test]
async fn test_worker_drains_both_queues() {
    let transport = MockTransport::healthy();
    let dispatcher = TelemetryDispatcher::new(test_config(), transport.clone()).unwrap();
    dispatcher.start();
    assert!(dispatcher.is_running());

    dispatcher.enqueue_data(data(Status::Drowsy)).await.unwrap();
    dispatcher
        .enqueue_alert(AlertEvent::for_status(Status::Drowsy).unwrap())
        .await
        .unwrap();
    dispatcher.enqueue_data(data(Status::Normal)).await.unwrap();

    assert!(wait_until(|| transport.delivered.lock().len() == 3).await);
    assert_eq!(dispatcher.pending(), (0, 0));

    let delivered = transport.delivered.lock().clone();
    let data_statuses: Vec<String> = delivered
        .iter()
        .filter_map(|event| match event {
            TelemetryEvent::Data(d) => Some(d.status.clone()),
            TelemetryEvent::Alert(_) => None,
        })
        .collect();
    assert_eq!(data_statuses, vec!["drowsy".to_string(), "normal".to_string()]);
    assert!(delivered.iter().any(|event| matches!(
        event,
        TelemetryEvent::Alert(a) if a.alert_type == "drowsiness_detected"
    )));

    assert!(dispatcher.shutdown().await);
    assert!(!dispatcher.is_running());
    assert_eq!(dispatcher.stats().delivered, 3);
}

#[tokio::test]
async fn test_worker_wakes_on_push_not_idle_timer() {
    let transport = MockTransport::healthy();
    let config = TelemetryConfig {
        idle_interval_ms: 60_000,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();
    dispatcher.start();

    // Let the worker park on its idle wait first
    tokio::time::sleep(Duration::from_millis(50)).await;
    dispatcher.enqueue_data(data(Status::Yawning)).await.unwrap();

    let delivered = tokio::time::timeout(Duration::from_secs(2), async {
        while transport.delivery_calls() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(delivered.is_ok(), "worker slept through a push");

    assert!(dispatcher.shutdown().await);
}

#[tokio::test(start_paused = true)]
async fn test_delivery_failure_drops_event_and_keeps_state() {
    let transport = MockTransport::healthy();
    transport.reject_deliveries.store(true, Ordering::SeqCst);
    let config = TelemetryConfig {
        revalidate_after_failures: 0,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();
    dispatcher.start();

    for _ in 0..3 {
        dispatcher.enqueue_data(data(Status::Normal)).await.unwrap();
    }
    assert!(wait_until(|| transport.delivery_calls() == 3).await);

    // No retries, no re-queue, still connected
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.delivery_calls(), 3);
    assert_eq!(dispatcher.pending(), (0, 0));
    assert!(dispatcher.is_connected());
    assert_eq!(dispatcher.stats().delivery_failures, 3);
    assert_eq!(transport.health_calls(), 1);

    dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_delivery_failures_trigger_revalidation() {
    let transport = MockTransport::healthy();
    transport.reject_deliveries.store(true, Ordering::SeqCst);
    let config = TelemetryConfig {
        revalidate_after_failures: 2,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();
    dispatcher.start();

    dispatcher.enqueue_data(data(Status::Normal)).await.unwrap();
    dispatcher.enqueue_data(data(Status::Normal)).await.unwrap();
    assert!(wait_until(|| transport.delivery_calls() == 2).await);
    transport.healthy.store(false, Ordering::SeqCst);

    // Inside the cooldown the state is still trusted
    assert!(dispatcher.enqueue_data(data(Status::Normal)).await.is_ok());
    assert_eq!(transport.health_calls(), 1);
    assert!(wait_until(|| transport.delivery_calls() == 3).await);

    // Once the window has passed, the next submission re-probes and downgrades
    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(
        dispatcher.enqueue_data(data(Status::Normal)).await,
        Err(TelemetryError::Disconnected)
    );
    assert_eq!(transport.health_calls(), 2);
    assert!(!dispatcher.is_connected());

    dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_delivery_timeout_counts_as_failure() {
    let transport = MockTransport::healthy();
    *transport.delivery_delay.lock() = Some(Duration::from_secs(3600));
    let config = TelemetryConfig {
        delivery_timeout_seconds: 1,
        shutdown_wait_ms: 5_000,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();
    dispatcher.start();

    dispatcher.enqueue_data(data(Status::HeadTilt)).await.unwrap();
    assert!(wait_until(|| dispatcher.stats().delivery_failures == 1).await);
    assert!(transport.delivered.lock().is_empty());

    dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_proceeds_when_worker_is_stuck() {
    let transport = MockTransport::healthy();
    *transport.delivery_delay.lock() = Some(Duration::from_secs(3600));
    let config = TelemetryConfig {
        delivery_timeout_seconds: 60,
        shutdown_wait_ms: 100,
        ..test_config()
    };
    let dispatcher = TelemetryDispatcher::new(config, transport.clone()).unwrap();
    dispatcher.start();

    dispatcher.enqueue_data(data(Status::Drowsy)).await.unwrap();
    assert!(wait_until(|| transport.delivery_calls() == 1).await);

    let started = Instant::now();
    assert!(!dispatcher.shutdown().await);
    assert!(started.elapsed() < Duration::from_secs(1));

    // Second shutdown has nothing left to join
    assert!(dispatcher.shutdown().await);
}

#[tokio::test]
async fn test_start_after_shutdown_is_ignored() {
    let dispatcher = TelemetryDispatcher::new(test_config(), MockTransport::healthy()).unwrap();
    dispatcher.start();
    assert!(dispatcher.shutdown().await);
    dispatcher.start();
    assert!(!dispatcher.is_running());
}

#[test]
fn test_payloads_match_backend_contract() {
    let event = DataEvent::new(Severity::High, "drowsy");
    let json = serde_json::to_value(&event).unwrap();
    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["drowsiness_level", "status", "timestamp"]);
    assert_eq!(object["drowsiness_level"], "high");
    assert_eq!(object["status"], "drowsy");
    assert!(chrono::DateTime::parse_from_rfc3339(object["timestamp"].as_str().unwrap()).is_ok());

    let alert = AlertEvent::for_status(Status::Yawning).unwrap();
    let json = serde_json::to_value(&alert).unwrap();
    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["alert_type", "severity", "timestamp"]);
    assert_eq!(object["alert_type"], "yawning_detected");
    assert_eq!(object["severity"], "medium");

    assert!(AlertEvent::for_status(Status::Normal).is_none());
}

mod http {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    #[derive(Clone, Default)]
    struct FakeBackend {
        received: Arc<Mutex<Vec<(String, &'static str, Value)>>>,
    }

    async fn health() -> &'static str {
        "ok"
    }

    async fn receive_data(
        State(backend): State<FakeBackend>,
        Path(device): Path<String>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        backend.received.lock().push((device, "data", body));
        StatusCode::OK
    }

    async fn receive_alert(
        State(backend): State<FakeBackend>,
        Path(device): Path<String>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        if device == "broken" {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
        backend.received.lock().push((device, "alert", body));
        StatusCode::OK
    }

    async fn latest(Path(device): Path<String>) -> Json<Value> {
        Json(json!({ "device_id": device, "status": "normal" }))
    }

    async fn spawn_backend() -> (String, FakeBackend) {
        let backend = FakeBackend::default();
        let app = Router::new()
            .route("/api/health", get(health))
            .route("/api/devices/:id/data", post(receive_data).get(latest))
            .route("/api/devices/:id/alert", post(receive_alert))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/", addr), backend)
    }

    fn transport_for(base_url: String, device_id: &str) -> HttpTransport {
        HttpTransport::new(&BackendConfig {
            base_url,
            device_id: device_id.to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_transport_round_trip() {
        let (base_url, backend) = spawn_backend().await;
        let transport = transport_for(base_url, "device_01");
        assert!(transport.data_url().ends_with("/api/devices/device_01/data"));
        assert!(!transport.endpoint().ends_with('/'));

        transport.health().await.unwrap();
        transport
            .deliver(&TelemetryEvent::Data(DataEvent::new(Severity::High, "drowsy")))
            .await
            .unwrap();
        transport
            .deliver(&AlertEvent::for_status(Status::Drowsy).unwrap().into())
            .await
            .unwrap();

        let received = backend.received.lock().clone();
        assert_eq!(received.len(), 2);
        let (device, kind, body) = &received[0];
        assert_eq!((device.as_str(), *kind), ("device_01", "data"));
        assert_eq!(body["drowsiness_level"], "high");
        assert!(body.get("device_id").is_none());
        assert_eq!(received[1].2["alert_type"], "drowsiness_detected");

        let latest = transport.latest_data(Duration::from_secs(2)).await.unwrap();
        assert_eq!(latest["device_id"], "device_01");
    }

    #[tokio::test]
    async fn test_http_transport_non_200_is_delivery_error() {
        let (base_url, _backend) = spawn_backend().await;
        let transport = transport_for(base_url, "broken");

        let result = transport
            .deliver(&AlertEvent::new("yawning_detected", Severity::Medium).into())
            .await;
        assert!(matches!(
            result,
            Err(TelemetryError::Delivery {
                event_type: "alert",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_http_transport_unreachable_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = transport_for(format!("http://{}", addr), "device_01");
        assert!(matches!(
            transport.health().await,
            Err(TelemetryError::Probe { .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatcher_over_http() {
        let (base_url, backend) = spawn_backend().await;
        let transport = Arc::new(transport_for(base_url, "device_42"));
        let dispatcher = TelemetryDispatcher::new(test_config(), transport).unwrap();
        dispatcher.start();

        dispatcher.enqueue_data(data(Status::HeadTilt)).await.unwrap();
        assert!(wait_until(|| backend.received.lock().len() == 1).await);
        assert_eq!(backend.received.lock()[0].0, "device_42");

        assert!(dispatcher.shutdown().await);
    }
}
