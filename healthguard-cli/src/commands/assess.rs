//! Health assessment: two risk models plus AI advice

use super::{enter, Shown};
use crate::{display, wizard};
use anyhow::Result;
use clap::Args;
use healthguard_client::controllers::{AssessmentForm, Gender};
use healthguard_client::{AppContext, Route};
use std::io::IsTerminal;

#[derive(Args, Debug, Default)]
pub struct AssessArgs {
    /// Age in years (1-120)
    #[arg(long)]
    pub age: Option<u32>,

    /// male or female
    #[arg(long)]
    pub gender: Option<Gender>,

    /// Height in centimetres
    #[arg(long)]
    pub height: Option<f64>,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<f64>,

    /// Diastolic blood pressure in mmHg (default 110)
    #[arg(long)]
    pub blood_pressure: Option<f64>,

    #[arg(long)]
    pub pregnancies: Option<u32>,

    #[arg(long)]
    pub anaemia: bool,

    /// Diagnosed diabetes
    #[arg(long)]
    pub diabetes: bool,

    /// Diagnosed high blood pressure
    #[arg(long)]
    pub high_bp: bool,

    #[arg(long)]
    pub smoker: bool,

    /// Never prompt for missing fields
    #[arg(long)]
    pub no_input: bool,
}

impl From<&AssessArgs> for AssessmentForm {
    fn from(args: &AssessArgs) -> Self {
        AssessmentForm {
            age: args.age,
            gender: args.gender,
            height_cm: args.height,
            weight_kg: args.weight,
            blood_pressure: args.blood_pressure,
            pregnancies: args.pregnancies,
            anaemia: args.anaemia,
            diabetes: args.diabetes,
            high_bp: args.high_bp,
            smoker: args.smoker,
        }
    }
}

pub async fn run(ctx: &AppContext, args: &AssessArgs) -> Result<()> {
    if !enter(ctx, Route::Assessment) {
        return Ok(());
    }
    let interactive = !args.no_input && std::io::stdin().is_terminal();
    let form = wizard::complete_assessment(AssessmentForm::from(args), interactive)?;

    let result = ctx.assessment().submit(&form).await.shown()?;
    display::assessment(&result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::logged_in;
    use crate::commands::Reported;

    #[test]
    fn test_args_map_onto_form() {
        let args = AssessArgs {
            age: Some(45),
            gender: Some(Gender::Female),
            height: Some(165.0),
            weight: Some(60.0),
            smoker: true,
            ..Default::default()
        };
        let form = AssessmentForm::from(&args);
        assert_eq!(form.age, Some(45));
        assert_eq!(form.gender, Some(Gender::Female));
        assert_eq!(form.height_cm, Some(165.0));
        assert!(form.blood_pressure.is_none());
        assert!(form.smoker);
        assert!(!form.high_bp);
    }

    #[tokio::test]
    async fn test_full_flags_submit_without_prompting() {
        let (harness, ctx, _) = logged_in().await;
        let args = AssessArgs {
            age: Some(30),
            gender: Some(Gender::Male),
            height: Some(170.0),
            weight: Some(65.0),
            no_input: true,
            ..Default::default()
        };

        run(&ctx, &args).await.unwrap();
        harness.assert_called("/diabetes", 1).unwrap();
        harness.assert_called("/heart/predict", 1).unwrap();
        harness.assert_called("/user/save", 1).unwrap();
        harness
            .assert_field_equals("/user/save", "form_data.bmi", &serde_json::json!(22.5))
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_field_fails_as_reported() {
        let (harness, ctx, _) = logged_in().await;
        let args = AssessArgs {
            age: Some(30),
            no_input: true,
            ..Default::default()
        };

        let err = run(&ctx, &args).await.unwrap_err();
        assert!(err.is::<Reported>());
        harness.assert_no_requests().unwrap();
    }
}
