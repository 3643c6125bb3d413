use std::net::TcpListener;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::web::Data;
use awc::Client;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use campaign_server::{
    CampaignBody, CreateCampaignBody, DataBody, Database, MemoryDatabase, Settings, Storage,
};

async fn sqlite_database() -> Arc<dyn Database> {
    let settings = Settings {
        storage: Storage::Sqlite,
        database_url: "sqlite::memory:".to_string(),
        seed: false,
        ..Settings::default()
    };

    campaign_server::connect(&settings).await.unwrap()
}

fn new_year() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

#[actix_web::test]
async fn created_campaign_can_be_fetched() {
    let app = test::init_service(campaign_server::app(Data::from(sqlite_database().await))).await;

    let req = TestRequest::post()
        .uri("/campaigns")
        .set_json(json!({ "name": "Q1 Launch", "due_date": "2025-01-01T00:00:00Z" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: DataBody<CampaignBody> = test::read_body_json(resp).await;
    assert_eq!(created.data.name, "Q1 Launch");
    assert_eq!(created.data.due_date, Some(new_year()));

    let req = TestRequest::get()
        .uri(&format!("/campaigns/{}", created.data.campaign_id))
        .to_request();
    let fetched: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.data.campaign_id, created.data.campaign_id);
    assert_eq!(fetched.data.name, "Q1 Launch");
    assert_eq!(fetched.data.due_date, Some(new_year()));
    assert_eq!(fetched.data.created_at, created.data.created_at);
}

#[actix_web::test]
async fn due_date_without_offset_is_read_as_utc() {
    let app = test::init_service(campaign_server::app(Data::from(sqlite_database().await))).await;

    let req = TestRequest::post()
        .uri("/campaigns")
        .set_json(json!({ "name": "x", "due_date": "2025-01-01T00:00:00" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: DataBody<CampaignBody> = test::read_body_json(resp).await;
    assert_eq!(created.data.due_date, Some(new_year()));

    let uri = format!("/campaigns/{}", created.data.campaign_id);
    let req = TestRequest::put()
        .uri(&uri)
        .set_json(json!({ "name": "y", "due_date": "2025-01-01T00:00:00.000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri(&uri).to_request();
    let fetched: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.data.name, "y");
    assert_eq!(fetched.data.due_date, Some(new_year()));
}

#[actix_web::test]
async fn update_keeps_created_at() {
    let app = test::init_service(campaign_server::app(Data::from(sqlite_database().await))).await;

    let req = TestRequest::post()
        .uri("/campaigns")
        .set_json(json!({ "name": "draft" }))
        .to_request();
    let created: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created.data.due_date, None);

    let uri = format!("/campaigns/{}", created.data.campaign_id);
    let req = TestRequest::put()
        .uri(&uri)
        .set_json(json!({ "name": "final", "due_date": "2025-01-01T00:00:00Z" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: DataBody<CampaignBody> = test::read_body_json(resp).await;
    assert_eq!(updated.data.name, "final");
    assert_eq!(updated.data.due_date, Some(new_year()));
    assert_eq!(updated.data.created_at, created.data.created_at);

    let req = TestRequest::get().uri(&uri).to_request();
    let fetched: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.data.name, "final");
    assert_eq!(fetched.data.created_at, created.data.created_at);
}

#[actix_web::test]
async fn missing_campaigns_return_not_found() {
    let app = test::init_service(campaign_server::app(Data::from(sqlite_database().await))).await;

    let req = TestRequest::get().uri("/campaigns/4242").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4041001");
    assert_eq!(body["error_meta"]["campaign_id"], 4242);

    let req = TestRequest::put()
        .uri("/campaigns/4242")
        .set_json(json!({ "name": "ghost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::delete().uri("/campaigns/4242").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleted_campaign_is_gone() {
    let app = test::init_service(campaign_server::app(Data::from(sqlite_database().await))).await;

    let req = TestRequest::post()
        .uri("/campaigns")
        .set_json(json!({ "name": "short lived" }))
        .to_request();
    let created: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/campaigns/{}", created.data.campaign_id);

    let req = TestRequest::delete().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());

    let req = TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn list_contains_every_created_campaign() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let app = test::init_service(campaign_server::app(Data::from(db))).await;

    for name in ["one", "two", "three"] {
        let req = TestRequest::post()
            .uri("/campaigns")
            .set_json(json!({ "name": name }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = TestRequest::get().uri("/campaigns").to_request();
    let listed: DataBody<Vec<CampaignBody>> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.data.len() >= 3);
    for name in ["one", "two", "three"] {
        assert!(listed.data.iter().any(|campaign| campaign.name == name));
    }
}

#[actix_web::test]
async fn malformed_requests_are_rejected() {
    let app = test::init_service(campaign_server::app(Data::from(sqlite_database().await))).await;

    let req = TestRequest::post()
        .uri("/campaigns")
        .set_json(json!({ "due_date": "2025-01-01T00:00:00Z" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001000");

    let req = TestRequest::get().uri("/campaigns/not-a-number").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4001001");

    let req = TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "E4041000");
}

#[actix_web::test]
async fn index_says_hello() {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let app = test::init_service(campaign_server::app(Data::from(db))).await;

    let req = TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "message": "Hello World" }));
}

#[actix_web::test]
async fn sqlite_file_survives_reconnect_without_reseeding() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        storage: Storage::Sqlite,
        database_url: format!("sqlite://{}", dir.path().join("campaigns.db").display()),
        seed: true,
        ..Settings::default()
    };

    let db = campaign_server::connect(&settings).await.unwrap();
    let app = test::init_service(campaign_server::app(Data::from(db))).await;
    let req = TestRequest::post()
        .uri("/campaigns")
        .set_json(json!({ "name": "Q1 Launch", "due_date": "2025-01-01T00:00:00Z" }))
        .to_request();
    let created: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    drop(app);

    let db = campaign_server::connect(&settings).await.unwrap();
    let app = test::init_service(campaign_server::app(Data::from(db))).await;

    let req = TestRequest::get().uri("/campaigns").to_request();
    let listed: DataBody<Vec<CampaignBody>> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.data.len(), 3);

    let req = TestRequest::get()
        .uri(&format!("/campaigns/{}", created.data.campaign_id))
        .to_request();
    let fetched: DataBody<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.data.name, created.data.name);
    assert_eq!(fetched.data.due_date, Some(new_year()));
    assert_eq!(fetched.data.created_at, created.data.created_at);
}

#[actix_web::test]
async fn create_campaign_over_http() {
    let settings = Settings {
        storage: Storage::Memory,
        ..Settings::default()
    };
    let db = campaign_server::connect(&settings).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let server = campaign_server::serve(listener, db).unwrap();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let client = Client::default();

    let seeded: DataBody<Vec<CampaignBody>> = client
        .get(format!("http://{}/campaigns", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seeded.data.len(), 2);

    let body = CreateCampaignBody {
        name: "The Green Bean Brigade".into(),
        due_date: None,
    };
    let mut response = client
        .post(format!("http://{}/campaigns", address))
        .send_json(&body)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let campaign: DataBody<CampaignBody> = response.json().await.unwrap();
    assert_eq!(campaign.data.name, "The Green Bean Brigade".to_string());

    let response = client
        .delete(format!(
            "http://{}/campaigns/{}",
            address, campaign.data.campaign_id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    handle.stop(true).await;
}
