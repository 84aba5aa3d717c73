//! API integration tests
//!
//! The router is driven in-process; the remote stock / order API is an axum
//! app served on an ephemeral port.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use stockscan_server::{
    api,
    config::{
        ApiConfig, AppConfig, AuthConfig, LoggingConfig, ScannerConfig, ServerConfig,
        StationConfig, StockTakeConfig,
    },
    models::UserClaims,
    services::Services,
    AppState,
};

const JWT_SECRET: &str = "integration-secret";

/// Requests received by the fake remote API
#[derive(Default)]
struct Upstream {
    captures: Mutex<Vec<Value>>,
    status_changes: Mutex<Vec<Value>>,
    order_captures: Mutex<Vec<Value>>,
    references: AtomicUsize,
}

async fn spawn_upstream(upstream: Arc<Upstream>) -> String {
    let references = upstream.clone();
    let captures = upstream.clone();
    let changes = upstream.clone();
    let order_captures = upstream;

    let router = Router::new()
        .route(
            "/sage/stock/check/bybarcode",
            post(|Json(body): Json<Value>| async move {
                match body["Barcode"].as_str() {
                    Some("6001234567890") => Json(json!([{
                        "StockLink": 411,
                        "Code": "WIDGET-10",
                        "Description_1": "Widget 10mm",
                        "ucIIDesc1": "Widget 10mm zinc plated",
                        "ItemCost": 12,
                        "QtyOnHand": 40,
                        "Barcode": "6001234567890"
                    }])),
                    _ => Json(json!([])),
                }
            }),
        )
        .route(
            "/toms/warehouse/stocktake/ref",
            post(move || async move {
                let n = references.references.fetch_add(1, Ordering::SeqCst) + 1;
                Json(json!([{ "StockTakeRef": format!("REF{:03}", n) }]))
            }),
        )
        .route(
            "/toms/warehouse/stocktake",
            post(move |Json(body): Json<Value>| async move {
                captures.captures.lock().unwrap().push(body);
                Json(json!({ "message": "captured" }))
            }),
        )
        .route(
            "/sales/fetchcaptured",
            post(|| async {
                Json(json!({
                    "unmatchedOrders": [{
                        "AutoIndex": 9912,
                        "OrderNum": "SO-20331",
                        "Account": "CASH001",
                        "OrderDate": "2026-10-01",
                        "Priority": 1,
                        "OrdTotIncl": 1250.5
                    }]
                }))
            }),
        )
        .route(
            "/sales/changestatus",
            post(move |Json(body): Json<Value>| async move {
                changes.status_changes.lock().unwrap().push(body);
                Json(json!({ "message": "updated" }))
            }),
        )
        .route(
            "/sales/getuncaptured",
            post(|| async {
                Json(json!({
                    "unmatchedOrders": [
                        { "AutoIndex": "10452", "OrderNum": "SO-20417", "DeliveryNote": "DN-5531", "ExtOrderNum": "PO-7781", "cAccountName": "Bay Gas", "DelMethodID": 3 },
                        { "AutoIndex": "10453", "OrderNum": "SO-20418", "DeliveryNote": null, "ExtOrderNum": null, "cAccountName": "Karoo Hardware", "DelMethodID": 1 }
                    ]
                }))
            }),
        )
        .route(
            "/sales/captureorder",
            post(move |Json(body): Json<Value>| async move {
                order_captures.order_captures.lock().unwrap().push(body);
                Json(json!({ "message": "captured" }))
            }),
        )
        .route(
            "/toms/tripsheet",
            post(|Json(body): Json<Value>| async move {
                match body["id"].as_str() {
                    Some("40") => Json(json!([{
                        "AutoIndex": 77,
                        "Customer_Account": "BAY001",
                        "Customer_Name": "Bay Gas",
                        "OrderNum": "SO-20331",
                        "InvNumber": "INV-8812",
                        "InvTotExcl": 1087.25,
                        "DelNoteNum": "DN-5531",
                        "PodDate": null
                    }])),
                    _ => Json(json!([])),
                }
            }),
        )
        .route(
            "/toms/dn/fetch",
            post(|Json(body): Json<Value>| async move {
                if body["DNN"] != "DN-5531" {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(Json(json!({
                    "deliveryNote": {
                        "DNN": "DN-5531",
                        "Chrono": "2026-10-18T09:12:00Z",
                        "CustomerName": "Bay Gas",
                        "AccCode": "BAY001",
                        "DelMethod": 2,
                        "CreatedBy": "sales@example.com",
                        "Priority": 0,
                        "CurrentStatus": 12
                    },
                    "stockDetails": [
                        { "DNN": "DN-5531", "StockCode": "REG-2KG", "Item": "Regulator 2kg", "Price": 149.5, "Qty": 2 },
                        { "DNN": "DN-5531", "StockCode": "HOSE-1M", "Item": "Hose 1m", "Price": 35, "Qty": 3 }
                    ]
                })))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn test_app() -> (Router, Arc<Upstream>) {
    let upstream = Arc::new(Upstream::default());
    let base_url = spawn_upstream(upstream.clone()).await;

    let config = AppConfig {
        server: ServerConfig::default(),
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        api: ApiConfig {
            base_url,
            timeout_seconds: 5,
            ..ApiConfig::default()
        },
        scanner: ScannerConfig::default(),
        station: StationConfig::default(),
        stocktake: StockTakeConfig::default(),
    };

    let services = Services::new(&config).unwrap();
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    (api::router(state), upstream)
}

fn token(email: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub: "operator-7".to_string(),
        email: Some(email.to_string()),
        exp: now + 3600,
        iat: now,
    }
    .create_token(JWT_SECRET)
    .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Poll a session until the pushed frame has been looked up
async fn wait_for_lookup(app: &Router, token: &str, id: &str) -> Value {
    let uri = format!("/api/v1/sessions/{}", id);
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (status, body) = send(app, Method::GET, &uri, Some(token), None).await;
            assert_eq!(status, StatusCode::OK);
            if body["phase"] == "ready" || body["phase"] == "error" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("lookup never finished")
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_fetch_user_requires_token() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/fetchUser", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = send(&app, Method::GET, "/api/fetchUser", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_fetch_user_returns_email() {
    let (app, _) = test_app().await;
    let token = token("picker@example.com");

    let (status, body) = send(&app, Method::GET, "/api/fetchUser", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "picker@example.com");
}

#[tokio::test]
async fn test_sessions_require_authentication() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, Method::POST, "/api/v1/sessions", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_scan_and_capture_flow() {
    let (app, upstream) = test_app().await;
    let token = token("picker@example.com");

    // Mount
    let (status, session) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["phase"], "scanning");
    assert_eq!(session["reference"], "REF001");
    assert_eq!(session["operator"], "picker@example.com");
    let id = session["id"].as_str().unwrap().to_string();

    // Scan
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/frames", id),
        Some(&token),
        Some(json!({ "text": "6001234567890" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let session = wait_for_lookup(&app, &token, &id).await;
    assert_eq!(session["phase"], "ready");
    assert_eq!(session["code"], "6001234567890");
    assert_eq!(session["stock"]["Code"], "WIDGET-10");
    assert!(session["error"].is_null());

    // Fill in the count
    let (status, session) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/form", id),
        Some(&token),
        Some(json!({ "quantity": "25" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["quantity"], 25);

    // Capture
    let (status, session) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/capture", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(session["error"].is_null());
    assert!(session["quantity"].is_null());
    assert!(session["code"].is_null());
    assert!(session["last_successful"].is_null());
    assert_eq!(session["reference"], "REF002");

    let captures = upstream.captures.lock().unwrap().clone();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0]["BatchNo"], "REF001");
    assert_eq!(captures[0]["StkCode"], "WIDGET-10");
    assert_eq!(captures[0]["StkItem"], "Widget 10mm");
    assert_eq!(captures[0]["Count"], 25);
    assert_eq!(captures[0]["name"], "picker@example.com");

    // Close
    let (status, session) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/sessions/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["phase"], "idle");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_barcode_reports_error() {
    let (app, _) = test_app().await;
    let token = token("picker@example.com");

    let (_, session) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&token),
        Some(json!({})),
    )
    .await;
    let id = session["id"].as_str().unwrap().to_string();

    send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/frames", id),
        Some(&token),
        Some(json!({ "text": "0000000000000" })),
    )
    .await;

    let session = wait_for_lookup(&app, &token, &id).await;
    assert_eq!(session["phase"], "error");
    assert!(session["stock"].is_null());
    assert!(session["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch stock info"));
}

#[tokio::test]
async fn test_capture_without_scan_is_rejected() {
    let (app, upstream) = test_app().await;
    let token = token("picker@example.com");

    let (_, session) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&token),
        Some(json!({})),
    )
    .await;
    let id = session["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/capture", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Rejected");
    assert!(upstream.captures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_quantity_is_rejected() {
    let (app, _) = test_app().await;
    let token = token("picker@example.com");

    let (_, session) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&token),
        Some(json!({})),
    )
    .await;
    let id = session["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/form", id),
        Some(&token),
        Some(json!({ "quantity": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_station_reported_camera_error() {
    let (app, _) = test_app().await;
    let token = token("picker@example.com");

    let (status, session) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&token),
        Some(json!({ "camera_error": "Permission denied" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["scanning_available"], false);
    assert!(session["error"].as_str().unwrap().contains("Permission denied"));
}

#[tokio::test]
async fn test_unknown_session_returns_not_found() {
    let (app, _) = test_app().await;
    let token = token("picker@example.com");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/sessions/6f1c1e2a-3b7d-4c8e-9f00-0a1b2c3d4e5f",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchSession");
}

#[tokio::test]
async fn test_order_statuses_by_stage() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/orders/statuses/dispatch", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["code"].as_i64().unwrap())
        .collect();
    assert_eq!(codes, vec![11, 21, 12, 13]);
}

#[tokio::test]
async fn test_change_order_status() {
    let (app, upstream) = test_app().await;
    let token = token("dispatch@example.com");

    let (status, orders) = send(&app, Method::GET, "/api/v1/orders/captured", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/orders/status",
        Some(&token),
        Some(json!({
            "stage": "dispatch",
            "orders": [{
                "auto_index": 9912,
                "order_num": "SO-20331",
                "priority": "high",
                "status": 12
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let sent = upstream.status_changes.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0]["OrdNum"], "SO-20331");
    assert_eq!(sent[0][0]["Status"], 12);
    assert_eq!(sent[0][0]["User"], "dispatch@example.com");
}

#[tokio::test]
async fn test_capture_desk_flow() {
    let (app, upstream) = test_app().await;
    let token = token("sales@example.com");

    let (status, orders) = send(&app, Method::GET, "/api/v1/orders/uncaptured", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["auto_index"], 10452);
    assert_eq!(orders[0]["priority"], "normal");
    assert_eq!(orders[1]["delivery_note"], Value::Null);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/orders/capture",
        Some(&token),
        Some(json!({
            "date_captured": "2026-10-19T08:30:00Z",
            "orders": [
                { "auto_index": 10452, "order_num": "SO-20417", "priority": "high", "del_method_id": 3 },
                { "auto_index": 10453, "order_num": "SO-20418", "del_method_id": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["captured"], 2);
    assert_eq!(body["message"], "2 orders captured successfully.");

    let sent = upstream.order_captures.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0]["OrdNum"], "SO-20417");
    assert_eq!(sent[0][0]["User"], "sales@example.com");
    assert_eq!(sent[0][0]["DateCaptured"], "2026-10-19T08:30:00.000Z");
    assert_eq!(sent[0][0]["Priority"], 1);
    assert_eq!(sent[0][1]["Priority"], 0);
    assert_eq!(sent[0][1]["DelMethodID"], 1);
}

#[tokio::test]
async fn test_capture_without_orders_is_rejected() {
    let (app, upstream) = test_app().await;
    let token = token("sales@example.com");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/orders/capture",
        Some(&token),
        Some(json!({ "orders": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert!(upstream.order_captures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_trip_sheet() {
    let (app, _) = test_app().await;
    let token = token("dispatch@example.com");

    let (status, body) = send(&app, Method::GET, "/api/v1/tripsheets/40", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["OrderNum"], "SO-20331");
    assert_eq!(entries[0]["DelNoteNum"], "DN-5531");

    let (status, body) = send(&app, Method::GET, "/api/v1/tripsheets/41", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_delivery_note() {
    let (app, _) = test_app().await;
    let token = token("dispatch@example.com");

    let (status, note) = send(&app, Method::GET, "/api/v1/deliverynotes/DN-5531", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["customer_name"], "Bay Gas");
    assert_eq!(note["status_label"], "Received In Dispatch");
    assert_eq!(note["lines"].as_array().unwrap().len(), 2);
    assert_eq!(note["total"].as_str().map(|t| t.parse::<f64>().unwrap()), Some(404.0));

    let (status, body) = send(&app, Method::GET, "/api/v1/deliverynotes/DN-0000", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "UpstreamFailure");
}

#[tokio::test]
async fn test_dispatch_documents_require_authentication() {
    let (app, _) = test_app().await;

    let (status, _) = send(&app, Method::GET, "/api/v1/tripsheets/40", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
