// ABOUTME: Integration tests for the HTTP API router
// ABOUTME: Drives requests through the full router against an in-memory database

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use rfpdesk_api::{create_router, AppState};
use rfpdesk_auth::NewUser;
use rfpdesk_core::{FixedClock, Role};
use rfpdesk_storage::in_memory_pool;

struct TestApp {
    router: Router,
    buyer: String,
    other_buyer: String,
    supplier: String,
    stranger: String,
    supplier_company: String,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 7, 10, 0, 0).unwrap()
}

async fn user_token(state: &AppState, email: &str, role: Role, company_id: &str) -> String {
    let user = state
        .users
        .create_user(
            NewUser {
                email: email.to_string(),
                name: email.to_string(),
                role,
                company_id: company_id.to_string(),
            },
            now(),
        )
        .await
        .unwrap();
    state
        .sessions
        .issue(&user.id, Duration::hours(8), now())
        .await
        .unwrap()
        .token
}

async fn setup() -> TestApp {
    let pool = in_memory_pool().await.unwrap();
    let state = AppState::new(pool, Duration::minutes(5), Arc::new(FixedClock::new(now())));

    let buyer_co = state.users.create_company("Buyer Co", now()).await.unwrap();
    let other_co = state.users.create_company("Other Buyer", now()).await.unwrap();
    let supplier_co = state.users.create_company("Supplier Co", now()).await.unwrap();
    let stranger_co = state.users.create_company("Stranger Co", now()).await.unwrap();

    TestApp {
        buyer: user_token(&state, "buyer@buyer.test", Role::Buyer, &buyer_co.id).await,
        other_buyer: user_token(&state, "buyer@other.test", Role::Buyer, &other_co.id).await,
        supplier: user_token(&state, "bids@supplier.test", Role::Supplier, &supplier_co.id).await,
        stranger: user_token(&state, "bids@stranger.test", Role::Supplier, &stranger_co.id).await,
        supplier_company: supplier_co.id,
        router: create_router(state),
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_rfp(app: &TestApp, title: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/rfps",
        Some(&app.buyer),
        Some(json!({
            "title": title,
            "submissionEnd": (now() + Duration::days(5)).to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

#[tokio::test]
async fn test_health_requires_no_auth() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/api/rfps", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    assert!(body["request_id"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/rfps", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_buyer_rfp_lifecycle() {
    let app = setup().await;
    let rfp = create_rfp(&app, "Fleet leasing").await;
    let id = rfp["id"].as_str().unwrap().to_string();
    assert_eq!(rfp["stage"], "INTAKE");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/tasks", id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let intake = body["data"].as_array().unwrap();
    assert_eq!(intake.len(), 3);
    assert!(intake.iter().all(|t| t["stage"] == "INTAKE" && t["autoCreated"] == true));

    let (status, body) = send(&app, Method::GET, "/api/rfps", Some(&app.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);
    assert_eq!(body["data"]["data"][0]["id"], id.as_str());

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/sla", id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "status": "ok", "daysInStage": 0, "sla": 3 }));

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/transitions", id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(body["data"]["current"], "INTAKE");
    let options = body["data"]["options"].as_array().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0]["stage"], "QUALIFICATION");
    assert_eq!(options[0]["valid"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/rfps/{}/stage", id),
        Some(&app.buyer),
        Some(json!({ "stage": "DISCOVERY" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/rfps/{}/stage", id),
        Some(&app.buyer),
        Some(json!({ "stage": "QUALIFICATION" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rfp"]["stage"], "QUALIFICATION");
    assert_eq!(body["data"]["tasksCreated"].as_array().unwrap().len(), 3);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/tasks?stage=QUALIFICATION", id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    // The version read at creation is stale after the stage move
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/rfps/{}", id),
        Some(&app.buyer),
        Some(json!({ "title": "Fleet leasing 2027", "expectedVersion": rfp["version"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/rfps/{}", id),
        Some(&app.buyer),
        Some(json!({ "title": "Fleet leasing 2027" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Fleet leasing 2027");

    // An SLA override can be cleared back to the stage default
    for (update, expected_sla) in [
        (json!({ "stageSlaDays": 1 }), 1),
        (json!({ "clear": ["stageSlaDays"] }), 5),
    ] {
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/rfps/{}", id),
            Some(&app.buyer),
            Some(update),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/rfps/{}/sla", id),
            Some(&app.buyer),
            None,
        )
        .await;
        assert_eq!(body["data"]["sla"], expected_sla);
    }

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/activity", id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert!(body["data"]["pagination"]["totalItems"].as_i64().unwrap() >= 3);
}

#[tokio::test]
async fn test_archived_rfp_rejects_writes() {
    let app = setup().await;
    let rfp = create_rfp(&app, "Cancelled project").await;
    let id = rfp["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/rfps/{}/stage", id),
        Some(&app.buyer),
        Some(json!({ "stage": "ARCHIVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rfp"]["isArchived"], true);

    let writes = [
        (Method::PUT, format!("/api/rfps/{}", id), json!({ "title": "Revived" })),
        (
            Method::POST,
            format!("/api/rfps/{}/stage", id),
            json!({ "stage": "QUALIFICATION" }),
        ),
        (
            Method::POST,
            format!("/api/rfps/{}/tasks", id),
            json!({ "title": "Anything" }),
        ),
        (
            Method::POST,
            format!("/api/rfps/{}/timeline/tick", id),
            json!({ "dryRun": false }),
        ),
    ];

    for (method, uri, payload) in writes {
        let (status, body) = send(&app, method, &uri, Some(&app.buyer), Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT, "{}", uri);
        assert_eq!(body["error"]["code"], "ARCHIVED_READ_ONLY", "{}", uri);
    }

    // Reads still work
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}", id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_is_scoped_to_company_and_invitations() {
    let app = setup().await;
    let rfp = create_rfp(&app, "Private").await;
    let uri = format!("/api/rfps/{}", rfp["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::GET, &uri, Some(&app.other_buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = send(&app, Method::GET, &uri, Some(&app.supplier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/rfps",
        Some(&app.supplier),
        Some(json!({ "title": "Supplier-made" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/rfps/rfp-missing", Some(&app.buyer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_supplier_response_flow_feeds_snapshots() {
    let app = setup().await;
    let rfp = create_rfp(&app, "Cloud hosting").await;
    let rfp_id = rfp["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/rfps/{}/suppliers", rfp_id),
        Some(&app.buyer),
        Some(json!({
            "email": "bids@supplier.test",
            "supplierCompanyId": app.supplier_company,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let contact_id = body["data"]["id"].as_str().unwrap().to_string();

    // Invited supplier can see the RFP but not the supplier list
    let (_, body) = send(&app, Method::GET, "/api/rfps", Some(&app.supplier), None).await;
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/suppliers", rfp_id),
        Some(&app.supplier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/rfps/{}/responses", rfp_id),
        Some(&app.supplier),
        Some(json!({
            "contactId": contact_id,
            "answersTotal": 20,
            "answersCompleted": 20,
            "complianceCoverage": 80.0,
            "extractedPricing": { "currency": "USD", "total": 10000.0, "lineItems": [] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let response_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/responses/{}/submit", response_id),
        Some(&app.stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/responses/{}/submit", response_id),
        Some(&app.supplier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted");
    assert_eq!(body["data"]["readinessScore"], 93.0);

    let brief_uri = format!("/api/rfps/{}/brief", rfp_id);
    let (status, body) = send(&app, Method::GET, &brief_uri, Some(&app.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fromCache"], false);
    assert_eq!(body["data"]["snapshot"]["responses"][0]["responseId"], response_id.as_str());
    assert_eq!(body["data"]["snapshot"]["recommendedNextStage"], "QUALIFICATION");

    let (_, body) = send(&app, Method::GET, &brief_uri, Some(&app.buyer), None).await;
    assert_eq!(body["data"]["fromCache"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/responses/{}/readiness", response_id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, &brief_uri, Some(&app.buyer), None).await;
    assert_eq!(body["data"]["fromCache"], false);

    let (status, body) = send(&app, Method::GET, "/api/portfolio", Some(&app.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["snapshot"]["totalRfps"], 1);
    assert_eq!(body["data"]["snapshot"]["scoredResponses"], 1);

    let (status, _) = send(&app, Method::GET, "/api/portfolio", Some(&app.supplier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_timeline_dry_run_and_notifications() {
    let app = setup().await;
    let rfp = create_rfp(&app, "Dry run").await;
    let rfp_id = rfp["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/rfps/{}/timeline/tick", rfp_id),
        Some(&app.buyer),
        Some(json!({ "dryRun": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dryRun"], true);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/rfps/{}/timeline/events", rfp_id),
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(body["data"]["pagination"]["totalItems"], 0);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/notifications?unreadOnly=true",
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/notifications/ntf-missing/read",
        Some(&app.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/rfps",
        Some(&app.buyer),
        Some(json!({ "description": "no title" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
