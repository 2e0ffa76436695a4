//! Health risk assessment
//!
//! Diabetes and heart predictions run in parallel, the record is saved, then
//! the advisory chain (`/health_prompt` -> `/deepseek_call`) enriches the
//! result. Only the first two steps can fail the submission.

use super::{acquire, report, AppContext};
use crate::error::{ClientError, Result};
use crate::models::{
    AdviceRequest, DiabetesRequest, HeartRequest, Prediction, PredictionPair, PromptRequest,
    SaveAssessmentRequest,
};
use crate::state::BusyFlag;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_BLOOD_PRESSURE: f64 = 110.0;
const ADVISORY_TASK: &str = "comprehensive health assessment";
const DEFAULT_PROMPT: &str = "Please give health advice based on this condition";
const NO_ADVICE: &str = "No health advice yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}' (male, female)", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Male => "male",
            Gender::Female => "female",
        })
    }
}

/// Form fields, also stored verbatim as the record's `form_data`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentForm {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    #[serde(rename = "height")]
    pub height_cm: Option<f64>,
    #[serde(rename = "weight")]
    pub weight_kg: Option<f64>,
    pub blood_pressure: Option<f64>,
    pub pregnancies: Option<u32>,
    pub anaemia: bool,
    pub diabetes: bool,
    #[serde(rename = "highBP")]
    pub high_bp: bool,
    pub smoker: bool,
}

struct Measurements {
    age: u32,
    gender: Gender,
    bmi: f64,
    blood_pressure: f64,
}

impl AssessmentForm {
    fn validate(&self) -> Result<Measurements> {
        let age = self
            .age
            .ok_or_else(|| ClientError::validation("age", "please enter your age"))?;
        if !(1..=120).contains(&age) {
            return Err(ClientError::validation("age", "must be between 1 and 120"));
        }
        let gender = self
            .gender
            .ok_or_else(|| ClientError::validation("gender", "please select a gender"))?;
        let height = positive(self.height_cm, "height")?;
        let weight = positive(self.weight_kg, "weight")?;
        if let Some(bp) = self.blood_pressure {
            if !bp.is_finite() || bp <= 0.0 {
                return Err(ClientError::validation("blood_pressure", "must be a positive number"));
            }
        }

        Ok(Measurements {
            age,
            gender,
            bmi: bmi(height, weight),
            blood_pressure: self.blood_pressure.unwrap_or(DEFAULT_BLOOD_PRESSURE),
        })
    }

    fn diabetes_request(&self, m: &Measurements) -> DiabetesRequest {
        let pregnancies = match m.gender {
            Gender::Female => self.pregnancies.unwrap_or(0),
            Gender::Male => 0,
        };
        DiabetesRequest {
            blood_pressure: m.blood_pressure,
            age: m.age,
            bmi: m.bmi,
            pregnancies,
        }
    }

    fn heart_request(&self, m: &Measurements) -> HeartRequest {
        HeartRequest {
            age: m.age,
            has_anaemia: u8::from(self.anaemia),
            diabetes: u8::from(self.diabetes),
            high_bp: u8::from(self.high_bp),
            sex: u8::from(m.gender == Gender::Male),
            smoker: u8::from(self.smoker),
        }
    }
}

fn positive(value: Option<f64>, field: &'static str) -> Result<f64> {
    match value {
        None => Err(ClientError::validation(field, "required")),
        Some(v) if !v.is_finite() || v <= 0.0 => {
            Err(ClientError::validation(field, "must be a positive number"))
        }
        Some(v) => Ok(v),
    }
}

/// weight / (height in metres)², one decimal
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let metres = height_cm / 100.0;
    (weight_kg / (metres * metres) * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
}

impl BmiCategory {
    pub fn of(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi > 24.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentResult {
    pub bmi: f64,
    pub diabetes: Prediction,
    pub heart: Prediction,
    /// Absent when the advisory chain failed
    pub advice: Option<String>,
}

impl AssessmentResult {
    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::of(self.bmi)
    }
}

pub struct AssessmentController {
    ctx: AppContext,
    busy: BusyFlag,
    last: Mutex<Option<AssessmentResult>>,
}

impl AssessmentController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            busy: BusyFlag::new(),
            last: Mutex::new(None),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn last_result(&self) -> Option<AssessmentResult> {
        self.last.lock().clone()
    }

    pub async fn submit(&self, form: &AssessmentForm) -> Result<AssessmentResult> {
        let notifier = self.ctx.notifier.as_ref();
        let m = form
            .validate()
            .map_err(|e| report(notifier, e, "Invalid input"))?;
        let _busy = acquire(&self.busy)?;
        *self.last.lock() = None;

        let user_id = self
            .ctx
            .session
            .username()
            .unwrap_or_else(|| "anonymous".to_string());
        let api = &self.ctx.api;
        let fallback = "Request failed, please check the backend service";

        let diabetes_req = form.diabetes_request(&m);
        let heart_req = form.heart_request(&m);
        let (diabetes, heart) = futures::try_join!(
            api.predict_diabetes(&diabetes_req),
            api.predict_heart(&heart_req)
        )
        .map_err(|e| report(notifier, e, fallback))?;

        let mut form_data = serde_json::to_value(form).unwrap_or_else(|_| json!({}));
        form_data["bmi"] = json!(m.bmi);
        api.save_assessment(&SaveAssessmentRequest {
            user_id,
            form_data,
            predictions: PredictionPair { diabetes, heart },
        })
        .await
        .map_err(|e| report(notifier, e, fallback))?;

        info!(
            "assessment done: bmi {} diabetes {} heart {}",
            m.bmi,
            diabetes.risk_tag(),
            heart.risk_tag()
        );
        notifier.success("Assessment complete, generating AI health advice...");

        let mut result = AssessmentResult {
            bmi: m.bmi,
            diabetes,
            heart,
            advice: None,
        };
        *self.last.lock() = Some(result.clone());

        result.advice = self.advise(&m, &diabetes, &heart).await;
        *self.last.lock() = Some(result.clone());
        Ok(result)
    }

    async fn advise(&self, m: &Measurements, diabetes: &Prediction, heart: &Prediction) -> Option<String> {
        let request = PromptRequest {
            task_name: ADVISORY_TASK.to_string(),
            inputs: json!({
                "age": m.age,
                "gender": m.gender,
                "bmi": m.bmi,
                "bloodPressure": m.blood_pressure,
            }),
            prediction: u8::from(heart.prediction || diabetes.prediction),
            probability: [heart.probability, diabetes.probability],
        };

        let prompt = match self.ctx.api.health_prompt(&request).await {
            Ok(resp) => resp
                .prompt
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            Err(e) => {
                warn!("advisory prompt unavailable: {}", e);
                return None;
            }
        };

        match self.ctx.api.advisory(&AdviceRequest { prompt }).await {
            Ok(resp) => Some(
                resp.result
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| NO_ADVICE.to_string()),
            ),
            Err(e) => {
                warn!("advisory call failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::testing::offline_context;
    use crate::notify::NoticeLevel;

    fn form() -> AssessmentForm {
        AssessmentForm {
            age: Some(30),
            gender: Some(Gender::Male),
            height_cm: Some(170.0),
            weight_kg: Some(65.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_bmi_one_decimal() {
        assert_eq!(bmi(170.0, 65.0), 22.5);
        assert_eq!(bmi(180.0, 90.0), 27.8);
        assert_eq!(bmi(160.0, 45.0), 17.6);
    }

    #[test]
    fn test_bmi_categories() {
        assert_eq!(BmiCategory::of(17.6), BmiCategory::Underweight);
        assert_eq!(BmiCategory::of(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::of(24.0), BmiCategory::Normal);
        assert_eq!(BmiCategory::of(24.1), BmiCategory::Overweight);
    }

    #[test]
    fn test_requests_from_form() {
        let mut f = form();
        f.pregnancies = Some(2);
        f.smoker = true;
        let m = f.validate().unwrap();

        let d = f.diabetes_request(&m);
        assert_eq!(d.pregnancies, 0);
        assert_eq!(d.blood_pressure, DEFAULT_BLOOD_PRESSURE);
        assert_eq!(d.bmi, 22.5);

        let h = f.heart_request(&m);
        assert_eq!((h.sex, h.smoker, h.high_bp), (1, 1, 0));

        f.gender = Some(Gender::Female);
        let m = f.validate().unwrap();
        assert_eq!(f.diabetes_request(&m).pregnancies, 2);
        assert_eq!(f.heart_request(&m).sex, 0);
    }

    #[test]
    fn test_form_data_keys() {
        let v = serde_json::to_value(form()).unwrap();
        assert_eq!(v["height"], json!(170.0));
        assert_eq!(v["gender"], json!("male"));
        assert!(v.get("highBP").is_some());
        assert!(v.get("bloodPressure").is_some());
    }

    #[tokio::test]
    async fn test_missing_height_makes_no_request() {
        let (ctx, notifier) = offline_context();
        let mut f = form();
        f.height_cm = None;

        let controller = ctx.assessment();
        let err = controller.submit(&f).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "height", .. }));
        assert!(notifier.messages(NoticeLevel::Error).is_empty());
        assert_eq!(notifier.messages(NoticeLevel::Warning).len(), 1);
        assert!(controller.last_result().is_none());
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_gender_parsing() {
        assert_eq!("F".parse::<Gender>(), Ok(Gender::Female));
        assert!("x".parse::<Gender>().is_err());
    }
}
