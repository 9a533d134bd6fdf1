mod common;

use std::time::Duration;

use actix_web::{App, http::StatusCode, test, web::Data};
use chrono::NaiveTime;
use serde_json::{Value, json};

use attendance::auth::jwt::generate_access_token;
use attendance::config::Config;
use attendance::model::role::Role;
use attendance::routes;
use common::School;

const SECRET: &str = "test-secret";

fn config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        api_prefix: "/api".into(),
        rate_scan_per_min: 600,
        rate_protected_per_min: 1000,
        facility_utc_offset_minutes: 0,
        sweep_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        person_cache_ttl: Duration::from_secs(60),
    }
}

fn token(role: Role, person_id: Option<u64>) -> String {
    let bearer = generate_access_token(1, "tester".into(), role as u8, person_id, SECRET, 600).unwrap();
    format!("Bearer {}", bearer)
}

macro_rules! app {
    ($school:expr) => {{
        let school = $school;
        let config = config();
        test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .app_data(Data::new(school.scanner))
                .app_data(Data::new(school.workflow))
                .app_data(Data::new(school.stats))
                .configure(|cfg| routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

fn peer() -> std::net::SocketAddr {
    "127.0.0.1:12345".parse().unwrap()
}

#[actix_web::test]
async fn scan_then_duplicate() {
    let app = app!(School::new());

    let first = test::TestRequest::post()
        .uri("/api/attendance/scan")
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Device, None)))
        .set_json(json!({"identifier": "LRN-0001"}))
        .to_request();
    let resp = test::call_service(&app, first).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["personId"], 1);
    assert_eq!(body["person"]["displayName"], "Awa Diop");

    let second = test::TestRequest::post()
        .uri("/api/attendance/scan")
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Device, None)))
        .set_json(json!({"identifier": "LRN-0001"}))
        .to_request();
    let resp = test::call_service(&app, second).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Awa Diop already scanned today at "));
}

#[actix_web::test]
async fn unknown_badge_is_not_found() {
    let app = app!(School::new());

    let req = test::TestRequest::post()
        .uri("/api/attendance/scan")
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Staff, None)))
        .set_json(json!({"identifier": "LRN-9999"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn token_is_required() {
    let app = app!(School::new());

    let req = test::TestRequest::post()
        .uri("/api/attendance/scan")
        .peer_addr(peer())
        .set_json(json!({"identifier": "LRN-0001"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn learners_cannot_scan_or_dispose() {
    let school = School::new();
    let record = school
        .scanner
        .scan_badge("LRN-0001", common::at(2026, 3, 2, 9, 0, 0))
        .await
        .unwrap();
    let app = app!(school);

    let req = test::TestRequest::post()
        .uri("/api/attendance/scan")
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Learner, Some(1))))
        .set_json(json!({"identifier": "LRN-0001"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/attendance/{}/disposition", record.id))
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Learner, Some(1))))
        .set_json(json!({"status": "APPROVED"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn learner_justifies_and_staff_approves() {
    let school = School::new();
    let record = school
        .scanner
        .scan_badge("LRN-0001", common::at(2026, 3, 2, 9, 0, 0))
        .await
        .unwrap();
    let app = app!(school);

    // nothing submitted yet
    let req = test::TestRequest::put()
        .uri(&format!("/api/attendance/{}/disposition", record.id))
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Staff, None)))
        .set_json(json!({"status": "APPROVED"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // someone else's record
    let req = test::TestRequest::post()
        .uri(&format!("/api/attendance/{}/justification", record.id))
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Learner, Some(2))))
        .set_json(json!({"text": "Bus strike"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/attendance/{}/justification", record.id))
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Learner, Some(1))))
        .set_json(json!({"text": "Bus strike"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["awaitingReview"], true);

    let req = test::TestRequest::put()
        .uri(&format!("/api/attendance/{}/disposition", record.id))
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Staff, None)))
        .set_json(json!({"status": "APPROVED", "comment": "ok"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["justificationComment"], "ok");
}

#[actix_web::test]
async fn daily_stats_for_staff() {
    let app = app!(School::new());

    let req = test::TestRequest::get()
        .uri("/api/stats/daily?date=2026-03-02&group=1")
        .peer_addr(peer())
        .insert_header(("Authorization", token(Role::Staff, None)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["absent"], 2);
    assert_eq!(body["total"], 2);
    assert_eq!(body["groupId"], 1);
}
