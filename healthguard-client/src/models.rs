//! Wire types of the HealthGuard backend
//!
//! Decoding is lenient where the backend is: prediction and enable flags
//! arrive as bools or 0/1, the monitor status may carry localised labels, and
//! the check-in status comes in two shapes.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ===== Auth =====

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// `{success, message}` answer shared by most write endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AckResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ===== Risk prediction =====

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiabetesRequest {
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: f64,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Pregnancies")]
    pub pregnancies: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeartRequest {
    pub age: u32,
    pub has_anaemia: u8,
    #[serde(rename = "Diabetes")]
    pub diabetes: u8,
    #[serde(rename = "HighBP")]
    pub high_bp: u8,
    #[serde(rename = "Sex")]
    pub sex: u8,
    #[serde(rename = "Smoker")]
    pub smoker: u8,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        serialize_with = "lenient::flag_as_number"
    )]
    pub prediction: bool,
    #[serde(default, deserialize_with = "lenient::number")]
    pub probability: f64,
}

impl Prediction {
    /// `high risk (0.82)` / `low risk (0.11)`
    pub fn risk_tag(&self) -> String {
        let level = if self.prediction { "high risk" } else { "low risk" };
        format!("{} ({:.2})", level, self.probability)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PredictionPair {
    pub diabetes: Prediction,
    pub heart: Prediction,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveAssessmentRequest {
    pub user_id: String,
    pub form_data: Value,
    pub predictions: PredictionPair,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest {
    pub task_name: String,
    pub inputs: Value,
    pub prediction: u8,
    pub probability: [f64; 2],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptResponse {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdviceRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdviceResponse {
    #[serde(default)]
    pub result: Option<String>,
}

// ===== History =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub users: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecordRequest {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordDetail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub form_data: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub predictions: Map<String, Value>,
}

impl RecordDetail {
    /// Decoded prediction stored under `key` (`diabetes`, `heart`)
    pub fn prediction(&self, key: &str) -> Option<Prediction> {
        self.predictions
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// `{success, message, data}` envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

// ===== Check-in =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckinStatus {
    pub checked_in_today: bool,
    pub total: u32,
    pub streak: u32,
    pub recent: Vec<String>,
    pub today_mood: Option<String>,
}

/// Both observed status shapes: flat (`is_checked_in`, `total_days`) and the
/// older nested `data` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckinStatusResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    is_checked_in: Option<Value>,
    #[serde(default)]
    total_days: Option<u32>,
    #[serde(default)]
    today_mood: Option<String>,
    #[serde(default)]
    data: Option<LegacyCheckinStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LegacyCheckinStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    checked_in_today: bool,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    recent: Vec<String>,
}

impl CheckinStatusResponse {
    pub fn status(&self) -> CheckinStatus {
        if let Some(flag) = &self.is_checked_in {
            return CheckinStatus {
                checked_in_today: lenient::value_flag(flag),
                total: self.total_days.unwrap_or_default(),
                streak: 0,
                recent: Vec::new(),
                today_mood: self.today_mood.clone(),
            };
        }
        match &self.data {
            Some(legacy) => CheckinStatus {
                checked_in_today: legacy.checked_in_today,
                total: legacy.total,
                streak: legacy.streak,
                recent: legacy.recent.clone(),
                today_mood: self.today_mood.clone(),
            },
            None => CheckinStatus::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Energetic,
    Calm,
    Happy,
    Tired,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Energetic, Mood::Calm, Mood::Happy, Mood::Tired];

    pub fn key(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Happy => "happy",
            Mood::Tired => "tired",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Energetic => "Full of energy",
            Mood::Calm => "Calm inside",
            Mood::Happy => "Happy and relaxed",
            Mood::Tired => "A bit tired",
        }
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| format!("unknown mood '{}' (energetic, calm, happy, tired)", s))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckinResponse {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    /// Absent on backends that only report success
    #[serde(default)]
    pub checked_in: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
}

// ===== Guardian =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuardianConfig {
    #[serde(rename = "is_enabled", default, deserialize_with = "lenient::flag")]
    pub enabled: bool,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub threshold_hr_high: Option<u32>,
    #[serde(default)]
    pub threshold_bp_sys: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuardianSaveRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub config: GuardianConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuardianLog {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub alert_type: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub alert_value: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: String,
}

impl GuardianLog {
    pub fn is_sent(&self) -> bool {
        self.status.eq_ignore_ascii_case("sent")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerRequest {
    pub user_id: String,
    pub alert_type: String,
    pub value: String,
}

// ===== Live monitor =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Normal,
    Warning,
    Danger,
    #[default]
    Disconnected,
}

impl OverallStatus {
    /// Also accepts the backend's localised labels; anything else reads as
    /// a disconnected device.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal" | "正常" => OverallStatus::Normal,
            "warning" | "警告" => OverallStatus::Warning,
            "danger" | "危险" => OverallStatus::Danger,
            _ => OverallStatus::Disconnected,
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverallStatus::Normal => "normal",
            OverallStatus::Warning => "warning",
            OverallStatus::Danger => "danger",
            OverallStatus::Disconnected => "device not connected",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for OverallStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| OverallStatus::from_label(&l)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertSummary {
    #[serde(default, alias = "status")]
    pub overall_status: OverallStatus,
    #[serde(default)]
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentSample {
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub blood_oxygen: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub systolic_bp: Option<f64>,
    #[serde(default)]
    pub diastolic_bp: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorDataResponse {
    #[serde(default)]
    pub current: Option<CurrentSample>,
}

/// One entry of the rolling vitals history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSample {
    pub timestamp: String,
    pub heart_rate: Option<f64>,
    pub blood_oxygen: Option<f64>,
    pub temperature: Option<f64>,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
}

impl From<CurrentSample> for VitalSample {
    /// A sample without its own timestamp is stamped on receipt.
    fn from(current: CurrentSample) -> Self {
        Self {
            timestamp: current
                .timestamp
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            heart_rate: current.heart_rate,
            blood_oxygen: current.blood_oxygen,
            temperature: current.temperature,
            systolic_bp: current.systolic_bp,
            diastolic_bp: current.diastolic_bp,
        }
    }
}

// ===== Chat =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
}

mod lenient {
    use super::*;

    pub fn value_flag(value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
            _ => false,
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(value_flag(&Value::deserialize(deserializer)?))
    }

    pub fn flag_as_number<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        })
    }

    /// Stored payloads may come back null or as unparsed JSON text
    pub fn object<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => map,
            Value::String(s) => match serde_json::from_str(&s) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}
