use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tripdesk::config::AppConfig;
use tripdesk::db;
use tripdesk::routes;
use tripdesk::services::auth::issue_token;
use tripdesk::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expires_hours: 1,
        admin_email: "admin@example.com".to_string(),
        admin_password: "correct-horse".to_string(),
        cors_origin: None,
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState::new(conn, test_config()))
}

fn test_app(state: Arc<AppState>) -> Router {
    routes::router(state)
}

fn admin_token(state: &AppState) -> String {
    issue_token(&state.config.admin_email, &state.config).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> Response {
    test_app(state.clone()).oneshot(req).await.unwrap()
}

async fn body_json(res: Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_body(customer: &str, travelers: i64, total: f64) -> Value {
    json!({
        "tripId": "trip-spiti-01",
        "tripName": "Spiti Valley Expedition",
        "customerName": customer,
        "email": format!("{}@example.com", customer.to_lowercase().replace(' ', ".")),
        "phone": "+91 98765 43210",
        "message": "Vegetarian meals please",
        "travelers": travelers,
        "selectedDate": "2026-06-12",
        "selectedPrice": total / travelers.max(1) as f64,
        "totalAmount": total,
    })
}

async fn create_booking(state: &Arc<AppState>, customer: &str) -> Value {
    let res = send(
        state,
        request("POST", "/api/bookings", None, Some(booking_body(customer, 2, 45000.0))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["data"]["booking"].clone()
}

fn booking_count(state: &AppState) -> i64 {
    let db = state.db.lock().unwrap();
    db.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
        .unwrap()
}

// ── Health & Auth ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let res = send(&state, request("GET", "/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");
}

#[tokio::test]
async fn test_admin_endpoints_require_auth() {
    let state = test_state();

    for (method, uri) in [
        ("GET", "/api/bookings"),
        ("GET", "/api/bookings/some-id"),
        ("DELETE", "/api/bookings/some-id"),
        ("GET", "/api/bookings/admin/stats"),
        ("GET", "/api/custom-trips"),
        ("GET", "/api/admin/me"),
    ] {
        let res = send(&state, request(method, uri, None, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        let json = body_json(res).await;
        assert_eq!(json["status"], "fail");
    }

    let res = send(
        &state,
        request("GET", "/api/bookings", Some("wrong-token"), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patch_without_auth_does_not_touch_store() {
    let state = test_state();
    let booking = create_booking(&state, "Asha Rao").await;
    let id = booking["id"].as_str().unwrap();

    let res = send(
        &state,
        request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            None,
            Some(json!({ "status": "Confirmed" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = admin_token(&state);
    let res = send(&state, request("GET", &format!("/api/bookings/{id}"), Some(&token), None)).await;
    assert_eq!(body_json(res).await["data"]["booking"]["status"], "Pending");
}

#[tokio::test]
async fn test_auth_is_checked_before_body_and_query() {
    let state = test_state();

    for uri in ["/api/bookings/whatever", "/api/custom-trips/whatever"] {
        let res = send(
            &state,
            Request::builder()
                .method("PATCH")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let json = body_json(res).await;
        assert_eq!(json["status"], "fail");
        assert!(!json["message"].as_str().unwrap().contains("request body"));
    }

    let res = send(&state, request("GET", "/api/bookings?page=abc", None, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_with_other_role_is_forbidden() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let state = test_state();
    let claims = json!({
        "sub": "someone",
        "email": "someone@example.com",
        "role": "editor",
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let res = send(&state, request("GET", "/api/bookings", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_login_and_me() {
    let state = test_state();

    let res = send(
        &state,
        request(
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "wrong" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &state,
        request(
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "correct-horse" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let token = json["token"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["admin"]["role"], "admin");

    let res = send(&state, request("GET", "/api/admin/me", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["data"]["admin"]["email"], "admin@example.com");

    // Cookie credential works as well
    let res = send(
        &state,
        Request::builder()
            .uri("/api/admin/me")
            .header("Cookie", format!("jwt={token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_requires_fields() {
    let state = test_state();
    let res = send(
        &state,
        request("POST", "/api/admin/login", None, Some(json!({}))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let message = body_json(res).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("email"));
    assert!(message.contains("password"));
}

// ── Booking lifecycle ──

#[tokio::test]
async fn test_booking_lifecycle_end_to_end() {
    let state = test_state();
    let token = admin_token(&state);

    // Create on an empty store
    let res = send(
        &state,
        request("POST", "/api/bookings", None, Some(booking_body("Asha Rao", 2, 45000.0))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["status"], "success");
    let first = json["data"]["booking"].clone();
    assert_eq!(first["bookingCode"], "BK000001");
    assert_eq!(first["status"], "Pending");
    assert_eq!(first["travelers"], 2);
    assert_eq!(first["tripName"], "Spiti Valley Expedition");

    // Second booking gets the next code
    let second = create_booking(&state, "Vikram Singh").await;
    assert_eq!(second["bookingCode"], "BK000002");

    // No confirmed bookings yet
    let res = send(
        &state,
        request("GET", "/api/bookings?status=Confirmed", Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["results"], 0);
    assert_eq!(json["data"]["pagination"]["total"], 0);

    // Confirm the first booking
    let id = first["id"].as_str().unwrap();
    let res = send(
        &state,
        request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            Some(&token),
            Some(json!({ "status": "Confirmed" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["data"]["booking"]["status"], "Confirmed");

    let res = send(
        &state,
        request("GET", "/api/bookings/admin/stats", Some(&token), None),
    )
    .await;
    let stats = body_json(res).await["data"]["stats"].clone();
    assert_eq!(stats["totalBookings"], 2);
    assert_eq!(stats["confirmedBookings"], 1);
    assert_eq!(stats["pendingBookings"], 1);
    assert_eq!(stats["cancelledBookings"], 0);
    assert_eq!(stats["totalRevenue"], 90000.0);
    assert_eq!(stats["confirmedRevenue"], 45000.0);

    // Invalid create leaves the store untouched
    let res = send(
        &state,
        request("POST", "/api/bookings", None, Some(booking_body("Zero Group", 0, 100.0))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
    assert!(json["message"].as_str().unwrap().contains("travelers"));
    assert_eq!(booking_count(&state), 2);

    // Delete, then the record is gone
    let res = send(
        &state,
        request("DELETE", &format!("/api/bookings/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&state, request("GET", &format!("/api/bookings/{id}"), Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "No booking found with that ID");
}

#[tokio::test]
async fn test_create_reports_every_missing_field() {
    let state = test_state();
    let res = send(
        &state,
        request("POST", "/api/bookings", None, Some(json!({ "message": "hi" }))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let message = body_json(res).await["message"].as_str().unwrap().to_string();
    for field in [
        "tripId",
        "tripName",
        "customerName",
        "email",
        "phone",
        "travelers",
        "totalAmount",
    ] {
        assert!(message.contains(field), "{field} missing from: {message}");
    }
    assert_eq!(booking_count(&state), 0);
}

#[tokio::test]
async fn test_create_ignores_client_status() {
    let state = test_state();
    let mut body = booking_body("Asha Rao", 1, 1000.0);
    body["status"] = json!("Confirmed");

    let res = send(&state, request("POST", "/api/bookings", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["data"]["booking"]["status"], "Pending");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let state = test_state();
    let res = send(
        &state,
        Request::builder()
            .method("POST")
            .uri("/api/bookings")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["status"], "fail");
}

#[tokio::test]
async fn test_supplied_code_is_kept_and_duplicates_rejected() {
    let state = test_state();

    let mut body = booking_body("Asha Rao", 2, 45000.0);
    body["bookingCode"] = json!("BK000777");
    let res = send(&state, request("POST", "/api/bookings", None, Some(body.clone()))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["data"]["booking"]["bookingCode"], "BK000777");

    let res = send(&state, request("POST", "/api/bookings", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["status"], "fail");
    assert!(json["message"].as_str().unwrap().contains("already exists"));
    assert_eq!(booking_count(&state), 1);
}

#[tokio::test]
async fn test_generated_code_skips_supplied_code() {
    let state = test_state();
    let first = create_booking(&state, "Asha Rao").await;
    assert_eq!(first["bookingCode"], "BK000001");

    let mut body = booking_body("Vikram Sethi", 2, 45000.0);
    body["bookingCode"] = json!("BK000002");
    let res = send(&state, request("POST", "/api/bookings", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let next = create_booking(&state, "Meera Iyer").await;
    assert_eq!(next["bookingCode"], "BK000003");
    let after = create_booking(&state, "Kabir Das").await;
    assert_eq!(after["bookingCode"], "BK000004");
    assert_eq!(booking_count(&state), 4);
}

#[tokio::test]
async fn test_generated_codes_are_unique_and_well_formed() {
    let state = test_state();
    let mut codes = vec![];
    for i in 0..12 {
        let booking = create_booking(&state, &format!("Guest {i}")).await;
        codes.push(booking["bookingCode"].as_str().unwrap().to_string());
    }

    for (i, code) in codes.iter().enumerate() {
        assert_eq!(code.len(), 8);
        assert!(code.starts_with("BK"));
        assert_eq!(code[2..].parse::<usize>().unwrap(), i + 1);
    }
    let mut unique = codes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), codes.len());
}

#[tokio::test]
async fn test_update_keeps_code_and_created_at() {
    let state = test_state();
    let token = admin_token(&state);
    let booking = create_booking(&state, "Asha Rao").await;
    let id = booking["id"].as_str().unwrap();

    let res = send(
        &state,
        request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            Some(&token),
            Some(json!({
                "status": "Cancelled",
                "bookingCode": "BK999999",
                "createdAt": "2001-01-01T00:00:00",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await["data"]["booking"].clone();
    assert_eq!(updated["status"], "Cancelled");
    assert_eq!(updated["bookingCode"], booking["bookingCode"]);
    assert_eq!(updated["createdAt"], booking["createdAt"]);
}

#[tokio::test]
async fn test_update_rejects_unknown_status_and_missing_id() {
    let state = test_state();
    let token = admin_token(&state);
    let booking = create_booking(&state, "Asha Rao").await;
    let id = booking["id"].as_str().unwrap();

    let res = send(
        &state,
        request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            Some(&token),
            Some(json!({ "status": "Refunded" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(
        &state,
        request(
            "PATCH",
            "/api/bookings/does-not-exist",
            Some(&token),
            Some(json!({ "status": "Confirmed" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_id_leaves_records() {
    let state = test_state();
    let token = admin_token(&state);
    create_booking(&state, "Asha Rao").await;
    create_booking(&state, "Vikram Singh").await;

    let res = send(
        &state,
        request("DELETE", "/api/bookings/does-not-exist", Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(booking_count(&state), 2);
}

#[tokio::test]
async fn test_list_pagination_and_search() {
    let state = test_state();
    let token = admin_token(&state);

    let mut created = vec![];
    for i in 0..23 {
        let booking = create_booking(&state, &format!("Guest {i}")).await;
        created.push(booking["bookingCode"].as_str().unwrap().to_string());
    }

    let res = send(
        &state,
        request("GET", "/api/bookings?page=2&limit=10", Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["results"], 10);
    assert_eq!(json["data"]["pagination"]["total"], 23);
    assert_eq!(json["data"]["pagination"]["page"], 2);
    assert_eq!(json["data"]["pagination"]["pages"], 3);

    let codes: Vec<String> = json["data"]["bookings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["bookingCode"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = created.iter().rev().skip(10).take(10).cloned().collect();
    assert_eq!(codes, expected);

    // Defaults: page 1, limit 10
    let res = send(&state, request("GET", "/api/bookings", Some(&token), None)).await;
    let json = body_json(res).await;
    assert_eq!(json["results"], 10);
    assert_eq!(json["data"]["pagination"]["page"], 1);

    // Case-insensitive search on customer name
    let res = send(
        &state,
        request("GET", "/api/bookings?search=GUEST%2017", Some(&token), None),
    )
    .await;
    let json = body_json(res).await;
    assert_eq!(json["results"], 1);
    assert_eq!(json["data"]["bookings"][0]["customerName"], "Guest 17");
}

#[tokio::test]
async fn test_list_rejects_unknown_status_filter() {
    let state = test_state();
    let token = admin_token(&state);
    let res = send(
        &state,
        request("GET", "/api/bookings?status=Archived", Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_sum_matches_total() {
    let state = test_state();
    let token = admin_token(&state);

    let mut ids = vec![];
    for i in 0..6 {
        let booking = create_booking(&state, &format!("Guest {i}")).await;
        ids.push(booking["id"].as_str().unwrap().to_string());
    }
    for (id, status) in [(&ids[0], "Confirmed"), (&ids[1], "Confirmed"), (&ids[2], "Cancelled")] {
        let res = send(
            &state,
            request(
                "PATCH",
                &format!("/api/bookings/{id}"),
                Some(&token),
                Some(json!({ "status": status })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = send(
        &state,
        request("GET", "/api/bookings/admin/stats", Some(&token), None),
    )
    .await;
    let stats = body_json(res).await["data"]["stats"].clone();
    let sum = stats["pendingBookings"].as_i64().unwrap()
        + stats["confirmedBookings"].as_i64().unwrap()
        + stats["cancelledBookings"].as_i64().unwrap();
    assert_eq!(sum, stats["totalBookings"].as_i64().unwrap());
    assert_eq!(sum, booking_count(&state));
}

#[tokio::test]
async fn test_mutations_publish_events() {
    let state = test_state();
    let token = admin_token(&state);
    let mut rx = state.booking_events.subscribe();

    let booking = create_booking(&state, "Asha Rao").await;
    let id = booking["id"].as_str().unwrap();
    send(
        &state,
        request(
            "PATCH",
            &format!("/api/bookings/{id}"),
            Some(&token),
            Some(json!({ "status": "Confirmed" })),
        ),
    )
    .await;
    send(
        &state,
        request("DELETE", &format!("/api/bookings/{id}"), Some(&token), None),
    )
    .await;

    let kinds: Vec<String> = (0..3)
        .map(|_| {
            let event = rx.try_recv().unwrap();
            serde_json::to_value(event.kind).unwrap().as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(kinds, vec!["created", "updated", "deleted"]);
}

#[tokio::test]
async fn test_events_stream_requires_token() {
    let state = test_state();
    let res = send(
        &state,
        request("GET", "/api/bookings/admin/events", None, None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = admin_token(&state);
    let res = send(
        &state,
        request(
            "GET",
            &format!("/api/bookings/admin/events?token={token}"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
}

// ── Custom trips ──

#[tokio::test]
async fn test_custom_trip_flow() {
    let state = test_state();
    let token = admin_token(&state);

    let res = send(
        &state,
        request(
            "POST",
            "/api/custom-trips",
            None,
            Some(json!({
                "name": "Ravi Kumar",
                "email": "ravi@example.com",
                "phone": "+91 90000 11111",
                "destination": "Ladakh",
                "travelDate": "2026-08-01",
                "duration": "10 days",
                "travelers": 4,
                "budget": "2-3 lakh",
                "interests": ["biking", "monasteries"],
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let trip = body_json(res).await["data"]["customTrip"].clone();
    assert_eq!(trip["status"], "pending");
    assert_eq!(trip["interests"], json!(["biking", "monasteries"]));
    let id = trip["id"].as_str().unwrap();

    let res = send(
        &state,
        request(
            "PATCH",
            &format!("/api/custom-trips/{id}"),
            Some(&token),
            Some(json!({ "status": "quoted", "quotedPrice": 240000, "adminNotes": "sent itinerary v1" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await["data"]["customTrip"].clone();
    assert_eq!(updated["status"], "quoted");
    assert_eq!(updated["quotedPrice"], 240000.0);
    assert_eq!(updated["adminNotes"], "sent itinerary v1");

    let res = send(
        &state,
        request("GET", "/api/custom-trips?status=quoted&search=ladakh", Some(&token), None),
    )
    .await;
    let json = body_json(res).await;
    assert_eq!(json["results"], 1);
    assert_eq!(json["data"]["pagination"]["pages"], 1);

    let res = send(
        &state,
        request("GET", "/api/custom-trips/admin/stats", Some(&token), None),
    )
    .await;
    let stats = body_json(res).await["data"]["stats"].clone();
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["quoted"], 1);
    assert_eq!(stats["inProgress"], 0);

    let res = send(
        &state,
        request("DELETE", &format!("/api/custom-trips/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(
        &state,
        request("GET", &format!("/api/custom-trips/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_trip_validation() {
    let state = test_state();
    let res = send(
        &state,
        request(
            "POST",
            "/api/custom-trips",
            None,
            Some(json!({ "name": "Ravi", "email": "not-an-email", "travelers": 0 })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let message = body_json(res).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("email"));
    assert!(message.contains("phone"));
    assert!(message.contains("destination"));
    assert!(message.contains("travelers"));
}
