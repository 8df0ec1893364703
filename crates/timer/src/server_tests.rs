use super::*;
use crate::encoding::encode_location;
use std::time::Duration;

async fn spawn_test_server() -> (SocketAddr, Arc<TimerRegistry>) {
    let registry = Arc::new(TimerRegistry::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(registry.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, registry)
}

#[tokio::test]
async fn health_reports_tracked_panic_count() {
    let (addr, registry) = spawn_test_server().await;
    registry.start_tracking("a:1");

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["trackedPanics"], 1);
}

#[tokio::test]
async fn started_then_finished_round_trips_through_the_registry() {
    let (addr, registry) = spawn_test_server().await;
    let loc = "src/vdbe.c:1234";
    registry.start_tracking(loc);

    let client = reqwest::Client::new();
    let encoded = encode_location(loc);

    let resp = client
        .post(format!("http://{addr}/sim/{encoded}/started"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(registry.is_paused(loc));

    tokio::time::sleep(Duration::from_millis(10)).await;

    let resp = client
        .post(format!("http://{addr}/sim/{encoded}/finished"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!registry.is_paused(loc));
}

#[tokio::test]
async fn unknown_location_is_silently_accepted() {
    let (addr, _registry) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/sim/{}/started", encode_location("no:such:loc")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn debug_trackers_reports_elapsed_and_pause_state() {
    let (addr, registry) = spawn_test_server().await;
    registry.start_tracking("a:1");

    let resp = reqwest::get(format!("http://{addr}/debug/trackers")).await.unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["a:1"]["elapsedMs"].is_number());
    assert_eq!(body["a:1"]["isPaused"], false);
}
