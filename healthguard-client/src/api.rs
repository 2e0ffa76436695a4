//! API gateway - one typed function per backend capability
//!
//! All calls share a single `reqwest::Client` (one timeout, one origin).
//! Nothing is retried, cached or deduplicated: a transport error, a non-2xx
//! status, an undecodable body or a `success: false` payload comes back as a
//! [`ClientError`] and the caller decides what to show.

use crate::config::BackendConfig;
use crate::error::{ClientError, Result};
use crate::models::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ApiGateway {
    base_url: String,
    client: reqwest::Client,
}

impl ApiGateway {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!("GET {}", path);
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        Self::decode(path, resp).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", path);
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(path, resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("POST {}", path);
        let resp = self.client.post(self.url(path)).send().await?;
        Self::decode(path, resp).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = error_message(&bytes)
                .unwrap_or_else(|| format!("{} failed with status {}", path, status));
            return Err(ClientError::backend(Some(status.as_u16()), message));
        }

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|source| ClientError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    fn ensure_success(success: bool, message: Option<String>, fallback: &str) -> Result<()> {
        if success {
            Ok(())
        } else {
            Err(ClientError::backend(
                None,
                message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>, fallback: &str) -> Result<T> {
        Self::ensure_success(envelope.success, envelope.message, fallback)?;
        envelope
            .data
            .ok_or_else(|| ClientError::backend(None, fallback))
    }

    // === Auth ===

    pub async fn login(&self, credentials: &Credentials) -> Result<AckResponse> {
        let ack: AckResponse = self.post("/login", credentials).await?;
        Self::ensure_success(ack.success, ack.message.clone(), "login rejected")?;
        Ok(ack)
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<AckResponse> {
        let ack: AckResponse = self.post("/register", credentials).await?;
        Self::ensure_success(ack.success, ack.message.clone(), "registration rejected")?;
        Ok(ack)
    }

    // === Risk assessment ===

    pub async fn predict_diabetes(&self, req: &DiabetesRequest) -> Result<Prediction> {
        self.post("/diabetes", req).await
    }

    pub async fn predict_heart(&self, req: &HeartRequest) -> Result<Prediction> {
        self.post("/heart/predict", req).await
    }

    pub async fn save_assessment(&self, req: &SaveAssessmentRequest) -> Result<()> {
        let ack: AckResponse = self.post("/user/save", req).await?;
        Self::ensure_success(ack.success, ack.message, "saving the assessment failed")
    }

    // === History ===

    pub async fn list_records(&self) -> Result<Vec<HistoryRecord>> {
        let resp: ListRecordsResponse = self.get("/list_users", &[]).await?;
        Ok(resp.users)
    }

    pub async fn load_record(&self, id: i64) -> Result<RecordDetail> {
        let envelope: Envelope<RecordDetail> = self.post("/user/load", &RecordRequest { id }).await?;
        Self::unwrap_envelope(envelope, "record not found")
    }

    pub async fn delete_record(&self, id: i64) -> Result<()> {
        let ack: AckResponse = self.post("/user/delete", &RecordRequest { id }).await?;
        Self::ensure_success(ack.success, ack.message, "delete failed")
    }

    // === Advisory ===

    pub async fn health_prompt(&self, req: &PromptRequest) -> Result<PromptResponse> {
        self.post("/health_prompt", req).await
    }

    pub async fn advisory(&self, req: &AdviceRequest) -> Result<AdviceResponse> {
        self.post("/deepseek_call", req).await
    }

    // === Check-in ===

    pub async fn checkin_status(&self, user_id: &str) -> Result<CheckinStatus> {
        let resp: CheckinStatusResponse = self
            .get("/checkin/status", &[("user_id", user_id)])
            .await?;
        Self::ensure_success(resp.success, resp.message.clone(), "failed to load check-in status")?;
        Ok(resp.status())
    }

    pub async fn checkin(&self, req: &CheckinRequest) -> Result<CheckinResponse> {
        let resp: CheckinResponse = self.post("/checkin", req).await?;
        Self::ensure_success(resp.success, resp.message.clone(), "check-in failed")?;
        Ok(resp)
    }

    // === Guardian ===

    pub async fn guardian_config(&self, user_id: &str) -> Result<GuardianConfig> {
        let envelope: Envelope<GuardianConfig> = self
            .get("/guardian/config", &[("user_id", user_id)])
            .await?;
        Self::unwrap_envelope(envelope, "failed to load guardian config")
    }

    pub async fn save_guardian_config(&self, req: &GuardianSaveRequest) -> Result<()> {
        let ack: AckResponse = self.post("/guardian/config", req).await?;
        Self::ensure_success(ack.success, ack.message, "saving guardian config failed")
    }

    pub async fn guardian_logs(&self, user_id: &str) -> Result<Vec<GuardianLog>> {
        let envelope: Envelope<Vec<GuardianLog>> = self
            .get("/guardian/logs", &[("user_id", user_id)])
            .await?;
        Self::ensure_success(envelope.success, envelope.message, "failed to load alert logs")?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn trigger_guardian_alert(&self, req: &TriggerRequest) -> Result<()> {
        let ack: AckResponse = self.post("/guardian/trigger", req).await?;
        Self::ensure_success(ack.success, ack.message, "sending the test alert failed")
    }

    // === Live monitor ===

    pub async fn monitor_start(&self) -> Result<()> {
        let _: Value = self.post_empty("/start").await?;
        Ok(())
    }

    pub async fn monitor_stop(&self) -> Result<()> {
        let _: Value = self.post_empty("/stop").await?;
        Ok(())
    }

    pub async fn monitor_summary(&self) -> Result<AlertSummary> {
        self.get("/summary", &[]).await
    }

    pub async fn monitor_current(&self) -> Result<CurrentSample> {
        let resp: MonitorDataResponse = self.get("/data", &[]).await?;
        Ok(resp.current.unwrap_or_default())
    }

    // === Chat ===

    pub async fn chat(&self, req: &ChatRequest) -> Result<String> {
        let resp: ChatResponse = self.post("/chat/completion", req).await?;
        resp.reply
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ClientError::backend(None, "assistant returned no reply"))
    }
}

/// `message` or `error` field of an error body
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(br#"{"success": false, "message": "bad password"}"#).as_deref(),
            Some("bad password")
        );
        assert_eq!(
            error_message(br#"{"error": "No messages"}"#).as_deref(),
            Some("No messages")
        );
        assert_eq!(error_message(b"<html>502</html>"), None);
        assert_eq!(error_message(br#"{"message": ""}"#), None);
    }

    #[test]
    fn test_gateway_uses_prefixed_base() {
        let mut backend = BackendConfig::with_origin("http://localhost:5000");
        backend.api_prefix = Some("api".to_string());
        let gateway = ApiGateway::new(&backend).unwrap();
        assert_eq!(gateway.url("/login"), "http://localhost:5000/api/login");
    }

    #[test]
    fn test_envelope_without_data_is_an_error() {
        let envelope: Envelope<GuardianConfig> =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        let err = ApiGateway::unwrap_envelope(envelope, "missing").unwrap_err();
        assert_eq!(err.user_message("x"), "missing");
    }
}
