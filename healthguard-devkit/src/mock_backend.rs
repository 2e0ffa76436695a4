/*!
Mock HealthGuard backend

In-memory stand-in for every endpoint the client calls, with the same paths,
shapes and status codes as the real service. A middleware layer counts calls
per path and can inject failures or delays before the handler runs.
*/

use crate::fixtures::{BackendMessageBuilder, Payload};
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Which status shape `/checkin/status` answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckinShape {
    #[default]
    Flat,
    Legacy,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    id: i64,
    user_id: String,
    timestamp: String,
    form_data: Value,
    predictions: Value,
}

#[derive(Debug, Default)]
struct CheckinBook {
    today: Option<Option<String>>,
    total: u32,
    streak: u32,
    recent: Vec<String>,
}

#[derive(Debug)]
struct MockState {
    users: HashMap<String, String>,
    records: Vec<StoredRecord>,
    next_record_id: i64,
    checkins: HashMap<String, CheckinBook>,
    checkin_shape: CheckinShape,
    guardian: HashMap<String, Value>,
    guardian_logs: HashMap<String, Vec<Value>>,
    next_log_id: u64,
    diabetes: Value,
    heart: Value,
    advice: String,
    chat_reply: Option<String>,
    monitor_running: bool,
    sample_seq: u64,
    calls: HashMap<String, usize>,
    bodies: HashMap<String, Value>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            records: Vec::new(),
            next_record_id: 1,
            checkins: HashMap::new(),
            checkin_shape: CheckinShape::default(),
            guardian: HashMap::new(),
            guardian_logs: HashMap::new(),
            next_log_id: 1,
            diabetes: BackendMessageBuilder::prediction(true, 0.82),
            heart: BackendMessageBuilder::prediction(false, 0.11),
            advice: "Keep a balanced diet and exercise regularly.".to_string(),
            chat_reply: None,
            monitor_running: false,
            sample_seq: 0,
            calls: HashMap::new(),
            bodies: HashMap::new(),
            failing: HashSet::new(),
            delays: HashMap::new(),
        }
    }
}

/// Shared handle on the mock; clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: Option<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.state
            .lock()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    pub fn set_predictions(&self, diabetes: Value, heart: Value) {
        let mut s = self.state.lock();
        s.diabetes = diabetes;
        s.heart = heart;
    }

    pub fn set_advice(&self, advice: &str) {
        self.state.lock().advice = advice.to_string();
    }

    pub fn set_chat_reply(&self, reply: &str) {
        self.state.lock().chat_reply = Some(reply.to_string());
    }

    pub fn set_checkin_shape(&self, shape: CheckinShape) {
        self.state.lock().checkin_shape = shape;
    }

    /// Marks `user` as already checked in today.
    pub fn set_checked_in(&self, user: &str, mood: Option<&str>) {
        let mut s = self.state.lock();
        let book = s.checkins.entry(user.to_string()).or_default();
        if book.today.is_none() {
            book.total += 1;
            book.streak += 1;
        }
        book.today = Some(mood.map(str::to_string));
    }

    /// Stores a record directly, as if a previous session had saved it.
    pub fn seed_record(&self, user_id: &str, form_data: Value) -> i64 {
        let mut s = self.state.lock();
        let predictions = json!({ "diabetes": s.diabetes.clone(), "heart": s.heart.clone() });
        push_record(&mut s, user_id.to_string(), form_data, predictions)
    }

    /// Every later request to `path` answers 500.
    pub fn fail(&self, path: &str) {
        self.state.lock().failing.insert(path.to_string());
    }

    pub fn recover(&self, path: &str) {
        self.state.lock().failing.remove(path);
    }

    /// Holds every later request to `path` for `delay` before answering.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.state.lock().delays.insert(path.to_string(), delay);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.state.lock().calls.get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    pub fn call_counts(&self) -> HashMap<String, usize> {
        self.state.lock().calls.clone()
    }

    /// JSON body of the last request to `path`
    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.state.lock().bodies.get(path).cloned()
    }

    pub fn monitor_running(&self) -> bool {
        self.state.lock().monitor_running
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn reset_calls(&self) {
        let mut s = self.state.lock();
        s.calls.clear();
        s.bodies.clear();
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/diabetes", post(predict_diabetes))
            .route("/heart/predict", post(predict_heart))
            .route("/user/save", post(save_record))
            .route("/list_users", get(list_records))
            .route("/user/load", post(load_record))
            .route("/user/delete", post(delete_record))
            .route("/health_prompt", post(health_prompt))
            .route("/deepseek_call", post(advisory))
            .route("/checkin/status", get(checkin_status))
            .route("/checkin", post(checkin))
            .route("/guardian/config", get(guardian_config).post(save_guardian_config))
            .route("/guardian/logs", get(guardian_logs))
            .route("/guardian/trigger", post(guardian_trigger))
            .route("/start", post(monitor_start))
            .route("/stop", post(monitor_stop))
            .route("/summary", get(monitor_summary))
            .route("/data", get(monitor_data))
            .route("/chat/completion", post(chat_completion))
            .layer(middleware::from_fn_with_state(self.clone(), intercept))
            .with_state(self.clone())
    }

    fn record_body(&self, path: &str, body: &Value) {
        self.state.lock().bodies.insert(path.to_string(), body.clone());
    }
}

fn push_record(s: &mut MockState, user_id: String, form_data: Value, predictions: Value) -> i64 {
    let id = s.next_record_id;
    s.next_record_id += 1;
    s.records.push(StoredRecord {
        id,
        user_id,
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        form_data,
        predictions,
    });
    id
}

async fn intercept(State(mock): State<MockBackend>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let (failing, delay) = {
        let mut s = mock.state.lock();
        *s.calls.entry(path.clone()).or_insert(0) += 1;
        (s.failing.contains(&path), s.delays.get(&path).copied())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if failing {
        log::warn!("mock backend: injected failure on {}", path);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "simulated backend failure" })),
        )
            .into_response();
    }
    log::debug!("mock backend: {} {}", req.method(), path);
    next.run(req).await
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn missing_user() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(BackendMessageBuilder::ack(false, "Missing user_id")),
    )
}

// POST /login
async fn login(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/login", &body);
    let (username, password) = (str_field(&body, "username"), str_field(&body, "password"));
    if username.is_empty() || password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(BackendMessageBuilder::ack(false, "Username and password are required")),
        );
    }
    let known = mock.state.lock().users.get(username).is_some_and(|p| p == password);
    if known {
        (StatusCode::OK, Json(BackendMessageBuilder::ack(true, "Login successful")))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(BackendMessageBuilder::ack(false, "Invalid username or password")),
        )
    }
}

// POST /register
async fn register(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/register", &body);
    let (username, password) = (str_field(&body, "username"), str_field(&body, "password"));
    let mut s = mock.state.lock();
    if s.users.contains_key(username) {
        return (
            StatusCode::BAD_REQUEST,
            Json(BackendMessageBuilder::ack(false, "Username already exists")),
        );
    }
    s.users.insert(username.to_string(), password.to_string());
    (StatusCode::OK, Json(BackendMessageBuilder::ack(true, "Registration successful")))
}

// POST /diabetes
async fn predict_diabetes(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    mock.record_body("/diabetes", &body);
    Json(mock.state.lock().diabetes.clone())
}

// POST /heart/predict
async fn predict_heart(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    mock.record_body("/heart/predict", &body);
    Json(mock.state.lock().heart.clone())
}

// POST /user/save
async fn save_record(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    mock.record_body("/user/save", &body);
    let mut s = mock.state.lock();
    let user_id = str_field(&body, "user_id").to_string();
    let form_data = body.get("form_data").cloned().unwrap_or_else(|| json!({}));
    let predictions = body.get("predictions").cloned().unwrap_or_else(|| json!({}));
    push_record(&mut s, user_id, form_data, predictions);
    Json(json!({ "success": true }))
}

// GET /list_users
async fn list_records(State(mock): State<MockBackend>) -> Json<Value> {
    let s = mock.state.lock();
    let users: Vec<Value> = s
        .records
        .iter()
        .rev()
        .map(|r| json!({ "id": r.id, "user_id": r.user_id, "timestamp": r.timestamp }))
        .collect();
    Json(json!({ "users": users }))
}

// POST /user/load
async fn load_record(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/user/load", &body);
    let id = body.get("id").and_then(Value::as_i64);
    let s = mock.state.lock();
    match s.records.iter().find(|r| Some(r.id) == id) {
        Some(r) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "id": r.id,
                    "user_id": r.user_id,
                    "timestamp": r.timestamp,
                    "form_data": r.form_data,
                    "predictions": r.predictions,
                }
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(BackendMessageBuilder::ack(false, "Record not found")),
        ),
    }
}

// POST /user/delete
async fn delete_record(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    mock.record_body("/user/delete", &body);
    let id = body.get("id").and_then(Value::as_i64);
    mock.state.lock().records.retain(|r| Some(r.id) != id);
    Json(json!({ "success": true }))
}

// POST /health_prompt
async fn health_prompt(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    mock.record_body("/health_prompt", &body);
    let task = str_field(&body, "task_name");
    Json(json!({ "prompt": format!("Task: {}. Inputs: {}", task, body["inputs"]) }))
}

// POST /deepseek_call
async fn advisory(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    mock.record_body("/deepseek_call", &body);
    Json(json!({ "result": mock.state.lock().advice.clone() }))
}

// GET /checkin/status?user_id=
async fn checkin_status(State(mock): State<MockBackend>, Query(q): Query<UserQuery>) -> (StatusCode, Json<Value>) {
    let Some(user) = q.user_id.filter(|u| !u.is_empty()) else {
        return missing_user();
    };
    let s = mock.state.lock();
    let body = match s.checkins.get(&user) {
        None => match s.checkin_shape {
            CheckinShape::Flat => BackendMessageBuilder::flat_checkin_status(false, 0, None),
            CheckinShape::Legacy => BackendMessageBuilder::legacy_checkin_status(false, 0, 0, &[]),
        },
        Some(book) => match s.checkin_shape {
            CheckinShape::Flat => BackendMessageBuilder::flat_checkin_status(
                book.today.is_some(),
                book.total,
                book.today.clone().flatten().as_deref(),
            ),
            CheckinShape::Legacy => BackendMessageBuilder::legacy_checkin_status(
                book.today.is_some(),
                book.total,
                book.streak,
                &book.recent,
            ),
        },
    };
    (StatusCode::OK, Json(body))
}

// POST /checkin
async fn checkin(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/checkin", &body);
    let user = str_field(&body, "user_id").to_string();
    if user.is_empty() {
        return missing_user();
    }
    let mood = body.get("mood").and_then(Value::as_str).map(str::to_string);

    let mut s = mock.state.lock();
    let book = s.checkins.entry(user).or_default();
    if book.today.is_some() {
        return (
            StatusCode::OK,
            Json(json!({ "success": true, "checked_in": false, "message": "Already checked in today" })),
        );
    }
    book.today = Some(mood);
    book.total += 1;
    book.streak += 1;
    book.recent.push(chrono::Local::now().format("%Y-%m-%d").to_string());
    let message = format!("Check-in successful, {} days in a row", book.streak);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "checked_in": true,
            "message": message,
            "quote": "Small steps every day add up.",
        })),
    )
}

// GET /guardian/config?user_id=
async fn guardian_config(State(mock): State<MockBackend>, Query(q): Query<UserQuery>) -> (StatusCode, Json<Value>) {
    let Some(user) = q.user_id.filter(|u| !u.is_empty()) else {
        return missing_user();
    };
    let data = mock
        .state
        .lock()
        .guardian
        .get(&user)
        .cloned()
        .unwrap_or_else(BackendMessageBuilder::default_guardian_config);
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

// POST /guardian/config
async fn save_guardian_config(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/guardian/config", &body);
    let user = str_field(&body, "user_id").to_string();
    if user.is_empty() {
        return missing_user();
    }
    let mut config: Map<String, Value> = body.as_object().cloned().unwrap_or_default();
    config.remove("user_id");
    mock.state.lock().guardian.insert(user, Value::Object(config));
    (StatusCode::OK, Json(BackendMessageBuilder::ack(true, "Settings saved")))
}

// GET /guardian/logs?user_id=
async fn guardian_logs(State(mock): State<MockBackend>, Query(q): Query<UserQuery>) -> (StatusCode, Json<Value>) {
    let Some(user) = q.user_id.filter(|u| !u.is_empty()) else {
        return missing_user();
    };
    let mut logs = mock.state.lock().guardian_logs.get(&user).cloned().unwrap_or_default();
    logs.reverse();
    (StatusCode::OK, Json(json!({ "success": true, "data": logs })))
}

// POST /guardian/trigger
async fn guardian_trigger(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/guardian/trigger", &body);
    let user = str_field(&body, "user_id").to_string();
    if user.is_empty() {
        return missing_user();
    }
    let mut s = mock.state.lock();
    let id = s.next_log_id;
    s.next_log_id += 1;
    let log = BackendMessageBuilder::guardian_log(
        id,
        str_field(&body, "alert_type"),
        str_field(&body, "value"),
        "Sent",
    );
    s.guardian_logs.entry(user).or_default().push(log);
    (StatusCode::OK, Json(json!({ "success": true, "status": "Sent" })))
}

// POST /start
async fn monitor_start(State(mock): State<MockBackend>) -> Json<Value> {
    mock.state.lock().monitor_running = true;
    log::info!("mock backend: device simulation started");
    Json(json!({}))
}

// POST /stop
async fn monitor_stop(State(mock): State<MockBackend>) -> Json<Value> {
    mock.state.lock().monitor_running = false;
    log::info!("mock backend: device simulation stopped");
    Json(json!({}))
}

// GET /summary
async fn monitor_summary(State(mock): State<MockBackend>) -> Json<Value> {
    let s = mock.state.lock();
    if !s.monitor_running {
        return Json(BackendMessageBuilder::summary("disconnected", &[]));
    }
    // every fifth sample runs a fever
    if s.sample_seq > 0 && s.sample_seq % 5 == 0 {
        Json(BackendMessageBuilder::summary("warning", &["Temperature above 37.2"]))
    } else {
        Json(BackendMessageBuilder::summary("normal", &[]))
    }
}

// GET /data
async fn monitor_data(State(mock): State<MockBackend>) -> Json<Value> {
    let mut s = mock.state.lock();
    if !s.monitor_running {
        return Json(json!({ "current": null }));
    }
    s.sample_seq += 1;
    let seq = s.sample_seq as f64;
    let temperature = if s.sample_seq % 5 == 0 { 37.8 } else { 36.6 };
    Json(BackendMessageBuilder::vital_sample(
        70.0 + seq % 6.0,
        98.0,
        temperature,
        118.0,
        76.0,
    ))
}

// POST /chat/completion
async fn chat_completion(State(mock): State<MockBackend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.record_body("/chat/completion", &body);
    let messages = body.get("messages").and_then(Value::as_array).cloned().unwrap_or_default();
    let Some(last) = messages.last() else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "No messages" })));
    };

    let reply = match mock.state.lock().chat_reply.clone() {
        Some(reply) => reply,
        None => format!("You asked: {}", str_field(last, "content")),
    };
    let payload = Payload::new().set_bool("success", true).set_string("reply", reply);
    (StatusCode::OK, Json(payload.build()))
}
