mod common;

use axum_test::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_health_reports_healthy() {
    let ctx = common::create_test_state(50, 500);
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let response = server.get("/api/health").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["cache"]["status"], "ok");
    assert_eq!(body["checks"]["usage_queue"]["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
