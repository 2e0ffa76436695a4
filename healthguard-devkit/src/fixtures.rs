/*!
Builders for HealthGuard backend payloads

Canned bodies in the shapes the real backend answers with, used by the mock
backend and by tests that want to assert on them.
*/

use serde_json::{json, Map, Value};

/// JSON object built field by field
#[derive(Debug, Clone, Default)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field<S: Into<String>>(mut self, field: S, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn set_string<S: Into<String>, V: Into<String>>(self, field: S, value: V) -> Self {
        self.set_field(field, Value::String(value.into()))
    }

    /// Non-finite numbers become `null`
    pub fn set_number<S: Into<String>>(self, field: S, value: f64) -> Self {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.set_field(field, value)
    }

    pub fn set_bool<S: Into<String>>(self, field: S, value: bool) -> Self {
        self.set_field(field, Value::Bool(value))
    }

    pub fn with_timestamp(self) -> Self {
        self.set_string("timestamp", chrono::Utc::now().to_rfc3339())
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

pub struct BackendMessageBuilder;

impl BackendMessageBuilder {
    /// `{success, message}`
    pub fn ack(success: bool, message: &str) -> Value {
        json!({ "success": success, "message": message })
    }

    /// Prediction as the models answer it: flag as 0/1
    pub fn prediction(high_risk: bool, probability: f64) -> Value {
        Payload::new()
            .set_field("prediction", json!(u8::from(high_risk)))
            .set_number("probability", probability)
            .build()
    }

    pub fn flat_checkin_status(checked_in: bool, total_days: u32, mood: Option<&str>) -> Value {
        json!({
            "success": true,
            "is_checked_in": checked_in,
            "total_days": total_days,
            "today_mood": mood,
        })
    }

    pub fn legacy_checkin_status(checked_in: bool, total: u32, streak: u32, recent: &[String]) -> Value {
        json!({
            "success": true,
            "data": {
                "checked_in_today": checked_in,
                "total": total,
                "streak": streak,
                "recent": recent,
            }
        })
    }

    /// What the backend returns for a user that never saved settings
    pub fn default_guardian_config() -> Value {
        json!({
            "is_enabled": 0,
            "contact_name": "",
            "contact_email": "",
            "contact_phone": "",
            "threshold_hr_high": 120,
            "threshold_bp_sys": 160,
        })
    }

    pub fn guardian_log(id: u64, alert_type: &str, value: &str, status: &str) -> Value {
        Payload::new()
            .set_field("id", json!(id))
            .set_string("alert_type", alert_type)
            .set_string("alert_value", value)
            .set_string("status", status)
            .with_timestamp()
            .build()
    }

    pub fn summary(status: &str, alerts: &[&str]) -> Value {
        json!({ "overall_status": status, "alerts": alerts })
    }

    /// `/data` body around one vitals sample
    pub fn vital_sample(heart_rate: f64, blood_oxygen: f64, temperature: f64, systolic: f64, diastolic: f64) -> Value {
        let current = Payload::new()
            .set_number("heart_rate", heart_rate)
            .set_number("blood_oxygen", blood_oxygen)
            .set_number("temperature", temperature)
            .set_number("systolic_bp", systolic)
            .set_number("diastolic_bp", diastolic)
            .with_timestamp()
            .build();
        json!({ "current": current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_builder() {
        let payload = Payload::new()
            .set_string("id", "r1")
            .set_number("value", 42.0)
            .set_number("broken", f64::NAN)
            .set_bool("active", true)
            .with_timestamp()
            .build();

        assert_eq!(payload["id"], "r1");
        assert_eq!(payload["value"], 42.0);
        assert!(payload["broken"].is_null());
        assert_eq!(payload["active"], true);
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn test_backend_shapes() {
        let p = BackendMessageBuilder::prediction(true, 0.82);
        assert_eq!(p["prediction"], 1);
        assert_eq!(p["probability"], 0.82);

        let status = BackendMessageBuilder::legacy_checkin_status(false, 3, 2, &[]);
        assert_eq!(status["data"]["streak"], 2);

        let sample = BackendMessageBuilder::vital_sample(72.0, 98.0, 36.6, 118.0, 76.0);
        assert_eq!(sample["current"]["heart_rate"], 72.0);
        assert!(sample["current"]["timestamp"].is_string());
    }
}
