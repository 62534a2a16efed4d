//! Config-driven services and live registry replacement.

mod common;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use resource_router::config::{build_registry, parse_config};
use resource_router::{Registry, Service};

use common::{labelled, start_router};

const CONFIG: &str = r#"
[[services]]
root_path = "/orders"
produces = ["application/json"]

  [[services.routes]]
  name = "find-order"
  method = "GET"
  path = "/{id}"

  [[services.routes]]
  name = "create-order"
  method = "POST"
  consumes = ["application/json"]
  status = 201
"#;

#[tokio::test]
async fn test_configured_routes_echo_the_match() {
    let config = parse_config(CONFIG).unwrap();
    let router = start_router(build_registry(&config.services).unwrap()).await;

    let response = router
        .client
        .get(router.url("/orders/17"))
        .header("x-request-id", "order-lookup")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["service"], "/orders");
    assert_eq!(body["route"], "find-order");
    assert_eq!(body["method"], "GET");
    assert_eq!(body["params"]["id"], "17");
    assert_eq!(body["request_id"], "order-lookup");

    let response = router
        .client
        .post(router.url("/orders"))
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["route"], "create-order");
}

#[tokio::test]
async fn test_registry_update_takes_effect() {
    let mut before = Registry::new();
    before
        .register(
            Service::builder("/v")
                .route(Service::get("").to(labelled("v1")))
                .build()
                .unwrap(),
        )
        .unwrap();
    let router = start_router(before).await;

    let body = router.client.get(router.url("/v")).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, "v1");

    let mut after = Registry::new();
    after
        .register(
            Service::builder("/v")
                .route(Service::get("").to(labelled("v2")))
                .build()
                .unwrap(),
        )
        .unwrap();
    router.updates.send(after).unwrap();

    let mut body = String::new();
    for _ in 0..50 {
        body = router.client.get(router.url("/v")).send().await.unwrap().text().await.unwrap();
        if body == "v2" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(body, "v2");
}
