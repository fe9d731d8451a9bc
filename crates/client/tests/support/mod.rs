//! In-process stand-in for the remote directory API.
//!
//! Serves the auth and users endpoints the client talks to, plus a few routes
//! that misbehave on purpose (HTML on success, plain-text gateway error, JSON
//! error without a message).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Map, Value, json};

use userdesk_client::{ClientContext, MemoryStorage};

pub const USERNAME: &str = "emilys";
pub const PASSWORD: &str = "emilyspass";
pub const SEEDED_USERS: usize = 30;

const FIRST_NAMES: [&str; 10] = [
    "Emily", "Michael", "Sophia", "James", "Emma", "Olivia", "Alexander", "Ava", "Ethan", "Isabella",
];
const LAST_NAMES: [&str; 6] = ["Johnson", "Williams", "Brown", "Davis", "Miller", "Wilson"];
const BLOOD_GROUPS: [&str; 4] = ["O-", "A+", "B+", "AB-"];
const EYE_COLORS: [&str; 3] = ["Green", "Brown", "Light Blue"];

#[derive(Debug, Default)]
pub struct DirectoryState {
    users: Vec<Value>,
    tokens: HashMap<String, u64>,
    issued: u64,
    login_authorization: Vec<Option<String>>,
    last_filter_query: Option<String>,
}

impl DirectoryState {
    fn seeded() -> Self {
        let users = (1..=SEEDED_USERS as u64).map(seed_user).collect();
        Self {
            users,
            ..Self::default()
        }
    }

    fn issue_token(&mut self, user_id: u64) -> String {
        self.issued += 1;
        let token = format!("access-{}-{}", user_id, self.issued);
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn user(&self, id: u64) -> Option<&Value> {
        self.users.iter().find(|u| u["id"] == json!(id))
    }
}

fn seed_user(id: u64) -> Value {
    let i = (id - 1) as usize;
    let first = FIRST_NAMES[i % FIRST_NAMES.len()];
    let last = LAST_NAMES[i % LAST_NAMES.len()];
    let username = if id == 1 {
        USERNAME.to_string()
    } else {
        format!("{}{}", first.to_lowercase(), &last[..1].to_lowercase())
    };
    let gender = if i % 2 == 0 { "female" } else { "male" };

    json!({
        "id": id,
        "firstName": first,
        "lastName": last,
        "username": username,
        "email": format!("{}.{}{}@x.example.com", first.to_lowercase(), last.to_lowercase(), id),
        "age": 20 + (i % 30),
        "gender": gender,
        "bloodGroup": BLOOD_GROUPS[i % BLOOD_GROUPS.len()],
        "eyeColor": EYE_COLORS[i % EYE_COLORS.len()],
        "image": format!("https://img.example.com/{id}.png"),
        "address": { "city": "Phoenix", "postalCode": format!("85{:03}", id) },
        "company": { "department": "Engineering", "title": "Engineer" }
    })
}

/// Shared handle on the mock's state, for assertions from tests.
#[derive(Debug, Clone)]
pub struct MockDirectory(Arc<Mutex<DirectoryState>>);

impl MockDirectory {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(DirectoryState::seeded())))
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.0.lock().unwrap()
    }

    /// Invalidate every issued token, as if they had all expired.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// `Authorization` header seen on each login request, in order.
    pub fn login_authorization(&self) -> Vec<Option<String>> {
        self.lock().login_authorization.clone()
    }

    pub fn last_filter_query(&self) -> Option<String> {
        self.lock().last_filter_query.clone()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<u64, Response> {
        bearer(headers)
            .and_then(|token| self.lock().tokens.get(token).copied())
            .ok_or_else(unauthorized)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub directory: MockDirectory,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let directory = MockDirectory::new();
        let app = router(directory.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            directory,
            handle,
        }
    }

    /// Client context against this server with process-local session storage.
    pub fn context(&self) -> ClientContext {
        ClientContext::with_storage(&self.base_url, Arc::new(MemoryStorage::new())).unwrap()
    }

    /// Context that is already signed in as the seeded admin.
    pub async fn signed_in_context(&self) -> ClientContext {
        let ctx = self.context();
        ctx.auth.login(USERNAME, PASSWORD).await.unwrap();
        ctx
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn router(directory: MockDirectory) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/validate", get(validate))
        .route("/auth/refresh", post(refresh))
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/filter", get(filter_users))
        .route("/users/add", post(add_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/html", get(html_page))
        .route("/gateway", get(bad_gateway))
        .route("/crash", get(json_crash))
        .route("/echo-headers", get(echo_headers))
        .with_state(directory)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn unauthorized() -> Response {
    message(StatusCode::UNAUTHORIZED, "Invalid/expired Token!")
}

fn not_found(id: &str) -> Response {
    message(StatusCode::NOT_FOUND, &format!("User with id '{id}' not found"))
}

fn page(users: Vec<Value>, skip: usize, limit: usize) -> Value {
    let total = users.len();
    let take = if limit == 0 { usize::MAX } else { limit };
    let items: Vec<Value> = users.into_iter().skip(skip).take(take).collect();
    let count = items.len();
    json!({ "users": items, "total": total, "skip": skip, "limit": count })
}

fn number(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

async fn login(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = dir.lock();
    let seen = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.login_authorization.push(seen);

    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if username != USERNAME || password != PASSWORD {
        return message(StatusCode::BAD_REQUEST, "Invalid credentials");
    }

    let user = state.user(1).cloned().unwrap_or_default();
    let token = state.issue_token(1);

    Json(json!({
        "id": user["id"],
        "username": user["username"],
        "email": user["email"],
        "firstName": user["firstName"],
        "lastName": user["lastName"],
        "gender": user["gender"],
        "image": user["image"],
        "accessToken": token,
        "refreshToken": "refresh-not-used"
    }))
    .into_response()
}

async fn validate(State(dir): State<MockDirectory>, headers: HeaderMap) -> Response {
    match dir.authorize(&headers) {
        Ok(user_id) => Json(dir.lock().user(user_id).cloned().unwrap_or_default()).into_response(),
        Err(resp) => resp,
    }
}

async fn refresh(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }

    let mut state = dir.lock();
    let Some(old) = body["token"].as_str() else {
        return message(StatusCode::BAD_REQUEST, "Refresh token required");
    };
    let Some(user_id) = state.tokens.remove(old) else {
        return unauthorized();
    };
    let token = state.issue_token(user_id);

    Json(json!({ "accessToken": token, "refreshToken": "refresh-not-used" })).into_response()
}

async fn list_users(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }
    let users = dir.lock().users.clone();
    Json(page(users, number(&params, "skip", 0), number(&params, "limit", 30))).into_response()
}

async fn search_users(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }

    let needle = params.get("q").cloned().unwrap_or_default().to_lowercase();
    let matches: Vec<Value> = dir
        .lock()
        .users
        .iter()
        .filter(|u| {
            ["firstName", "lastName", "username", "email"]
                .iter()
                .filter_map(|key| u[*key].as_str())
                .any(|v| v.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();

    Json(page(matches, 0, 0)).into_response()
}

async fn filter_users(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }

    let mut state = dir.lock();
    state.last_filter_query = raw;

    let matches: Vec<Value> = state
        .users
        .iter()
        .filter(|u| {
            params.iter().all(|(key, wanted)| match &u[key.as_str()] {
                Value::Number(n) => n.to_string() == *wanted,
                Value::String(s) => s.eq_ignore_ascii_case(wanted),
                _ => false,
            })
        })
        .cloned()
        .collect();

    Json(page(matches, 0, 0)).into_response()
}

async fn add_user(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }
    let Value::Object(mut fields) = body else {
        return message(StatusCode::BAD_REQUEST, "Expected a JSON object");
    };

    let mut state = dir.lock();
    let next_id = state
        .users
        .iter()
        .filter_map(|u| u["id"].as_u64())
        .max()
        .unwrap_or(0)
        + 1;
    fields.insert("id".to_string(), json!(next_id));
    let record = Value::Object(fields);
    state.users.push(record.clone());

    (StatusCode::CREATED, Json(record)).into_response()
}

async fn get_user(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }
    let found = id.parse().ok().and_then(|n: u64| dir.lock().user(n).cloned());
    match found {
        Some(user) => Json(user).into_response(),
        None => not_found(&id),
    }
}

async fn update_user(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }

    let Ok(n) = id.parse::<u64>() else {
        return not_found(&id);
    };
    let mut state = dir.lock();
    let Some(user) = state.users.iter_mut().find(|u| u["id"] == json!(n)) else {
        return not_found(&id);
    };

    if let Some(fields) = user.as_object_mut() {
        for (key, value) in body {
            if key != "id" {
                fields.insert(key, value);
            }
        }
    }
    Json(user.clone()).into_response()
}

async fn delete_user(
    State(dir): State<MockDirectory>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = dir.authorize(&headers) {
        return resp;
    }

    let Ok(n) = id.parse::<u64>() else {
        return not_found(&id);
    };
    let mut state = dir.lock();
    let Some(pos) = state.users.iter().position(|u| u["id"] == json!(n)) else {
        return not_found(&id);
    };

    let mut removed = state.users.remove(pos);
    removed["isDeleted"] = json!(true);
    removed["deletedOn"] = json!("2026-10-18T09:00:00.000Z");
    Json(removed).into_response()
}

async fn html_page() -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><title>Maintenance</title></head><body>{}</body></html>",
        "We'll be back shortly. ".repeat(10)
    );
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}

async fn json_crash() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "boom" })),
    )
        .into_response()
}

async fn echo_headers(headers: HeaderMap) -> Response {
    let echoed: Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), json!(v)))
        })
        .collect();
    Json(Value::Object(echoed)).into_response()
}
