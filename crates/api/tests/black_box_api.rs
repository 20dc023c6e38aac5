use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use naslet_api::app::{build_app, AppState};
use naslet_auth::{get_password_hash, TokenCodec};
use naslet_core::{EventId, UserId};
use naslet_events::{Participation, User};
use naslet_infra::{InMemoryStore, SessionProvider};
use naslet_observability::Logger;

const JWT_SECRET: &str = "test-secret";
const CREATOR: &str = "creator@example.com";
const GUEST: &str = "guest@example.com";
const STRANGER: &str = "+15550100";

struct TestServer {
    base_url: String,
    store: InMemoryStore,
    creator: User,
    guest: User,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = InMemoryStore::new();
        let creator = seed(&store, Some(CREATOR), None, "creator-pw").await;
        let guest = seed(&store, Some(GUEST), None, "guest-pw").await;
        seed(&store, None, Some(STRANGER), "stranger-pw").await;

        // Same router as prod, in-memory store, ephemeral port.
        let tokens = TokenCodec::new(JWT_SECRET.as_bytes(), ChronoDuration::minutes(10));
        let state = AppState::new(Arc::new(store.clone()), tokens, Logger::detached("black-box"));
        let app = build_app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self { base_url, store, creator, guest, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn seed(store: &InMemoryStore, email: Option<&str>, phone: Option<&str>, password: &str) -> User {
    let user = User {
        id: UserId::new(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
        name: email.or(phone).unwrap().to_string(),
        password_hash: get_password_hash(password).unwrap(),
    };
    store.seed_user(user.clone()).await.unwrap();
    user
}

fn mint_jwt_at(sub: &str, issued: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = json!({
        "sub": sub,
        "iat": issued.timestamp(),
        "exp": (issued + ttl).timestamp(),
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(sub: &str) -> String {
    mint_jwt_at(sub, Utc::now(), ChronoDuration::minutes(10))
}

async fn create_event(client: &reqwest::Client, srv: &TestServer, token: &str, name: &str) -> Value {
    let res = client
        .post(srv.url("/event"))
        .bearer_auth(token)
        .json(&json!({ "name": name, "date": "2025-05-01", "price": 1000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "success": true }));

    let events: Vec<Value> = client
        .get(srv.url("/user/events"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    events
        .into_iter()
        .find(|e| e["name"] == name)
        .expect("created event is listed")
}

fn event_id(event: &Value) -> EventId {
    event["id"].as_str().unwrap().parse().unwrap()
}

async fn assert_error(res: reqwest::Response, status: StatusCode) -> Value {
    assert_eq!(res.status(), status);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], status.as_u16());
    assert!(body["message"].is_string());
    body
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/user/events")).send().await.unwrap();
    assert_error(res, StatusCode::UNAUTHORIZED).await;

    let res = client
        .get(srv.url("/user/events"))
        .bearer_auth("definitely.not.a-jwt")
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNAUTHORIZED).await;

    let expired = mint_jwt_at(CREATOR, Utc::now() - ChronoDuration::hours(2), ChronoDuration::minutes(10));
    let res = client
        .get(srv.url("/user/events"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn token_for_unknown_user_is_unauthorized() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(srv.url("/user/events"))
        .bearer_auth(mint_jwt("ghost@example.com"))
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn created_event_is_listed_for_its_creator_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);

    let event = create_event(&client, &srv, &token, "Launch").await;
    assert_eq!(event["creator_id"], json!(srv.creator.id));
    assert_eq!(event["date"], "2025-05-01");
    assert_eq!(event["price"], 1000);

    let filtered: Vec<Value> = client
        .get(srv.url(&format!("/user/events?id={}", event_id(&event))))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered, vec![event]);

    // Phone numbers identify users too.
    let theirs: Vec<Value> = client
        .get(srv.url("/user/events"))
        .bearer_auth(mint_jwt(STRANGER))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(theirs.is_empty());
}

#[tokio::test]
async fn event_can_be_created_from_query_string() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);

    let res = client
        .post(srv.url("/event?name=Party&date=2024-06-01&location=Harbour&price=250"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "success": true }));

    let events: Vec<Value> = client
        .get(srv.url("/user/events"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["name"], "Party");
    assert_eq!(events[0]["date"], "2024-06-01");
    assert_eq!(events[0]["location"], "Harbour");
    assert_eq!(events[0]["price"], 250);
    assert_eq!(events[0]["description"], Value::Null);

    let res = client
        .post(srv.url("/event?name=Party"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn wrong_method_gets_json_error_body() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(srv.url("/event"))
        .bearer_auth(mint_jwt(CREATOR))
        .send()
        .await
        .unwrap();
    assert!(res.headers().contains_key("allow"));
    assert_error(res, StatusCode::METHOD_NOT_ALLOWED).await;
}

#[tokio::test]
async fn malformed_payloads_are_validation_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);

    let res = client
        .post(srv.url("/event"))
        .bearer_auth(&token)
        .json(&json!({ "name": "   ", "date": "2025-05-01" }))
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNPROCESSABLE_ENTITY).await;

    let res = client
        .post(srv.url("/event"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());

    let res = client
        .get(srv.url("/event/users?id=not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn participants_are_visible_to_the_owner_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);
    let event = create_event(&client, &srv, &token, "Dinner").await;
    srv.store
        .seed_participation(Participation::new(srv.guest.id, event_id(&event), Utc::now()))
        .await
        .unwrap();

    let rows: Vec<Value> = client
        .get(srv.url(&format!("/event/users?id={}", event_id(&event))))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user"]["email"], GUEST);
    assert_eq!(rows[0]["participation"]["status"], "pending");
    assert!(rows[0]["user"].get("password_hash").is_none());

    let res = client
        .get(srv.url(&format!("/event/users?id={}", event_id(&event))))
        .bearer_auth(mint_jwt(GUEST))
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::FORBIDDEN).await;

    let res = client
        .get(srv.url(&format!("/event/users?id={}", EventId::new())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn participation_status_change_is_idempotent() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);
    let event = create_event(&client, &srv, &token, "Concert").await;
    srv.store
        .seed_participation(Participation::new(srv.guest.id, event_id(&event), Utc::now()))
        .await
        .unwrap();

    for _ in 0..2 {
        let res = client
            .put(srv.url("/user/event/status"))
            .bearer_auth(&token)
            .json(&json!({ "user": srv.guest.id, "event": event_id(&event), "status": "approved" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let rows: Vec<Value> = client
        .get(srv.url(&format!("/event/users?id={}", event_id(&event))))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rows[0]["participation"]["status"], "approved");

    let res = client
        .put(srv.url("/user/event/status"))
        .bearer_auth(&token)
        .json(&json!({ "user_id": srv.guest.id, "event_id": event_id(&event), "status": "maybe" }))
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn kicked_user_disappears_from_participants() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);
    let event = create_event(&client, &srv, &token, "Workshop").await;
    srv.store
        .seed_participation(Participation::new(srv.guest.id, event_id(&event), Utc::now()))
        .await
        .unwrap();

    let kick = json!({ "user_id": srv.guest.id, "event_id": event_id(&event) });
    let res = client
        .post(srv.url("/user/event/kick"))
        .bearer_auth(mint_jwt(GUEST))
        .json(&kick)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::FORBIDDEN).await;

    let res = client
        .post(srv.url("/user/event/kick"))
        .bearer_auth(&token)
        .json(&kick)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let rows: Vec<Value> = client
        .get(srv.url(&format!("/event/users?id={}", event_id(&event))))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(rows.is_empty());

    let res = client
        .post(srv.url("/user/event/kick"))
        .bearer_auth(&token)
        .json(&kick)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn listed_event_can_be_edited_and_sent_back() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);
    let mut event = create_event(&client, &srv, &token, "Meetup").await;

    event["name"] = json!("Meetup v2");
    event["location"] = json!("Lisbon");
    let res = client
        .put(srv.url("/user/event"))
        .bearer_auth(&token)
        .json(&event)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let listed: Vec<Value> = client
        .get(srv.url("/user/events"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed, vec![event.clone()]);

    let res = client
        .put(srv.url("/user/event"))
        .bearer_auth(mint_jwt(GUEST))
        .json(&event)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::FORBIDDEN).await;
}

#[tokio::test]
async fn deleted_event_takes_participations_with_it() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(CREATOR);
    let event = create_event(&client, &srv, &token, "Picnic").await;
    let id = event_id(&event);
    srv.store
        .seed_participation(Participation::new(srv.guest.id, id, Utc::now()))
        .await
        .unwrap();

    let res = client
        .delete(srv.url(&format!("/event?id={id}")))
        .bearer_auth(mint_jwt(GUEST))
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::FORBIDDEN).await;

    let res = client
        .delete(srv.url(&format!("/event?id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(srv.url(&format!("/event/users?id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::NOT_FOUND).await;

    let mut session = srv.store.session().await.unwrap();
    assert_eq!(session.find_participation(srv.guest.id, id).await.unwrap(), None);
}

#[tokio::test]
async fn login_issues_usable_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/token"))
        .form(&[("username", CREATOR), ("password", "wrong")])
        .send()
        .await
        .unwrap();
    assert_error(res, StatusCode::UNAUTHORIZED).await;

    let res = client
        .post(srv.url("/token"))
        .form(&[("username", CREATOR), ("password", "creator-pw")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap();

    let res = client
        .get(srv.url("/user/events"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/nope")).await.unwrap();
    assert_error(res, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn cors_preflight_mirrors_origin_with_credentials() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, srv.url("/event"))
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], "https://app.example.com");
    assert_eq!(headers["access-control-allow-credentials"], "true");
}
