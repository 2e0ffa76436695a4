//! Interactive prompts
//!
//! Fills in whatever the command line left out: credentials, assessment
//! fields, guardian settings, and the first-time configuration written by
//! `healthguard config init`.

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Password;
use healthguard_client::config::{BackendConfig, MonitorConfig, SessionConfig, StorageKind};
use healthguard_client::controllers::{AssessmentForm, Gender, GuardianForm, LoginForm, RegisterForm};
use healthguard_client::ClientConfig;
use std::io::{self, Write};
use std::path::Path;

fn read_line() -> Result<String> {
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input).context("failed to read from stdin")?;
    Ok(input.trim().to_string())
}

pub fn prompt(prompt: &str) -> Result<String> {
    print!("❓ {}: ", prompt);
    read_line()
}

pub fn prompt_with_default(prompt: &str, default: &str) -> Result<String> {
    print!("❓ {} [{}]: ", prompt, default);
    let input = read_line()?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

pub fn prompt_with_default_parse<T: std::str::FromStr>(prompt: &str, default: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    loop {
        let input = prompt_with_default(prompt, default)?;
        match input.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => println!("❌ Invalid input: {}. Please try again.", e),
        }
    }
}

/// Re-asks until the answer parses; empty input is rejected
pub fn prompt_parse<T: std::str::FromStr>(prompt_text: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    loop {
        let input = prompt(prompt_text)?;
        if input.is_empty() {
            println!("❌ A value is required.");
            continue;
        }
        match input.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => println!("❌ Invalid input: {}. Please try again.", e),
        }
    }
}

pub fn prompt_optional(prompt_text: &str) -> Result<Option<String>> {
    let input = prompt(prompt_text)?;
    Ok((!input.is_empty()).then_some(input))
}

/// Empty input keeps `None`
pub fn prompt_optional_parse<T: std::str::FromStr>(prompt_text: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    loop {
        let Some(input) = prompt_optional(prompt_text)? else {
            return Ok(None);
        };
        match input.parse::<T>() {
            Ok(value) => return Ok(Some(value)),
            Err(e) => println!("❌ Invalid input: {}. Please try again.", e),
        }
    }
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    let default_str = if default { "Y/n" } else { "y/N" };

    loop {
        print!("❓ {} [{}]: ", prompt, default_str);
        let input = read_line()?.to_lowercase();
        if input.is_empty() {
            return Ok(default);
        }
        match input.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("❌ Please enter 'y' or 'n'."),
        }
    }
}

pub fn prompt_with_options(prompt: &str, options: &[(&str, &str)], default: &str) -> Result<String> {
    println!("❓ {}:", prompt);
    for (key, description) in options {
        let marker = if *key == default { "►" } else { " " };
        println!("  {} {} - {}", marker, key, description);
    }

    loop {
        print!("Choice [{}]: ", default);
        let input = read_line()?;
        if input.is_empty() {
            return Ok(default.to_string());
        }
        if options.iter().any(|(key, _)| *key == input) {
            return Ok(input);
        }
        println!("❌ Invalid choice. Please select from the available options.");
    }
}

/// Read without echo
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(format!("🔐 {}", prompt))
        .allow_empty_password(true)
        .interact()
        .context("failed to read password")
}

/// Given on the command line, the password doubles as its confirmation
fn register_passwords(password: Option<String>) -> Result<(String, String)> {
    match password {
        Some(p) => Ok((p.clone(), p)),
        None => Ok((prompt_password("Password")?, prompt_password("Confirm password")?)),
    }
}

pub fn login_form(username: Option<String>, password: Option<String>) -> Result<LoginForm> {
    let username = match username {
        Some(u) => u,
        None => prompt("Username")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password")?,
    };
    Ok(LoginForm { username, password })
}

pub fn register_form(username: Option<String>, password: Option<String>) -> Result<RegisterForm> {
    let username = match username {
        Some(u) => u,
        None => prompt("Choose a username")?,
    };
    let (password, confirm) = register_passwords(password)?;
    Ok(RegisterForm {
        username,
        password,
        confirm,
    })
}

/// Asks only for the fields still missing from `form`
pub fn complete_assessment(mut form: AssessmentForm, interactive: bool) -> Result<AssessmentForm> {
    if !interactive {
        return Ok(form);
    }

    println!("🩺 HEALTH ASSESSMENT");
    println!("────────────────────────────────────────");
    if form.age.is_none() {
        form.age = Some(prompt_parse("Age")?);
    }
    if form.gender.is_none() {
        let gender = prompt_with_options(
            "Gender",
            &[("male", "Male"), ("female", "Female")],
            "male",
        )?;
        form.gender = Some(gender.parse::<Gender>().map_err(anyhow::Error::msg)?);
    }
    if form.height_cm.is_none() {
        form.height_cm = Some(prompt_parse("Height (cm)")?);
    }
    if form.weight_kg.is_none() {
        form.weight_kg = Some(prompt_parse("Weight (kg)")?);
    }
    if form.blood_pressure.is_none() {
        form.blood_pressure = prompt_optional_parse("Diastolic blood pressure (mmHg, empty if unknown)")?;
    }
    if form.gender == Some(Gender::Female) && form.pregnancies.is_none() {
        form.pregnancies = prompt_optional_parse("Number of pregnancies")?;
    }
    println!();
    Ok(form)
}

/// Starts from the saved settings; every answer defaults to the current value
pub fn guardian_form(current: &GuardianForm) -> Result<GuardianForm> {
    println!("🛡️  GUARDIAN SETTINGS");
    println!("────────────────────────────────────────");
    println!("Alerts go to this contact when a vital crosses a threshold.");
    println!();

    let enabled = prompt_yes_no("Enable guardian alerts?", current.enabled)?;
    let contact_name = prompt_with_default("Contact name", &current.contact_name)?;
    let contact_email = prompt_with_default("Contact email", &current.contact_email)?;
    let contact_phone = prompt_with_default("Contact phone (optional)", &current.contact_phone)?;
    let threshold_hr_high = prompt_with_default_parse(
        "Heart rate alert above (bpm)",
        &current.threshold_hr_high.unwrap_or(120).to_string(),
    )?;
    let threshold_bp_sys = prompt_with_default_parse(
        "Systolic pressure alert above (mmHg)",
        &current.threshold_bp_sys.unwrap_or(160).to_string(),
    )?;
    println!();

    Ok(GuardianForm {
        enabled,
        contact_name,
        contact_email,
        contact_phone,
        threshold_hr_high: Some(threshold_hr_high),
        threshold_bp_sys: Some(threshold_bp_sys),
    })
}

pub struct SetupWizard;

impl SetupWizard {
    /// Walk through every config section; `None` when the user declines to save
    pub fn run(current: &ClientConfig, path: &Path) -> Result<Option<ClientConfig>> {
        println!();
        println!("🩺 ======================================");
        println!("   HEALTHGUARD CONFIGURATION WIZARD");
        println!("🩺 ======================================");
        println!();
        println!("Config file: {}", path.display().to_string().bright_black());
        println!();

        let config = ClientConfig {
            backend: Self::configure_backend(&current.backend)?,
            monitor: Self::configure_monitor(&current.monitor)?,
            session: Self::configure_session(&current.session)?,
        };

        Self::display_summary(&config);
        if prompt_yes_no("💾 Save this configuration?", true)? {
            Ok(Some(config))
        } else {
            println!("❌ Configuration cancelled.");
            Ok(None)
        }
    }

    fn configure_backend(current: &BackendConfig) -> Result<BackendConfig> {
        println!("🌐 BACKEND");
        println!("────────────────────────────────────────");
        println!("Where the HealthGuard server listens.");
        println!();

        let origin = prompt_with_default("Server origin", &current.origin)?;
        let api_prefix = prompt_with_default("API path prefix (- for none)", current.api_prefix.as_deref().unwrap_or("-"))?;
        let timeout_secs = prompt_with_default_parse("Request timeout (seconds)", &current.timeout_secs.to_string())?;
        println!();

        Ok(BackendConfig {
            origin,
            api_prefix: (api_prefix != "-" && !api_prefix.is_empty()).then_some(api_prefix),
            timeout_secs,
        })
    }

    fn configure_monitor(current: &MonitorConfig) -> Result<MonitorConfig> {
        println!("📈 LIVE MONITOR");
        println!("────────────────────────────────────────");

        let interval_ms = prompt_with_default_parse("Poll interval (ms)", &current.interval_ms.to_string())?;
        let history_capacity = prompt_with_default_parse("Samples kept in history", &current.history_capacity.to_string())?;
        println!();

        Ok(MonitorConfig {
            interval_ms,
            history_capacity,
        })
    }

    fn configure_session(current: &SessionConfig) -> Result<SessionConfig> {
        println!("🔐 SESSION");
        println!("────────────────────────────────────────");

        let default = storage_key(current.storage);
        let choice = prompt_with_options(
            "Where should the login session be kept",
            &[
                ("file", "JSON file next to the config"),
                ("keyring", "OS keyring for the token, file for the username"),
                ("memory", "Nothing persisted, log in on every run"),
            ],
            default,
        )?;
        let storage = match choice.as_str() {
            "keyring" => StorageKind::Keyring,
            "memory" => StorageKind::Memory,
            _ => StorageKind::File,
        };
        println!();

        Ok(SessionConfig {
            storage,
            path: current.path.clone(),
        })
    }

    fn display_summary(config: &ClientConfig) {
        println!("📋 CONFIGURATION SUMMARY");
        println!("────────────────────────────────────────");
        println!("🌐 Backend:");
        println!("   Origin: {}", config.backend.origin);
        println!("   Prefix: {}", config.backend.api_prefix.as_deref().unwrap_or("none"));
        println!("   Timeout: {}s", config.backend.timeout_secs);
        println!();
        println!("📈 Monitor:");
        println!("   Interval: {}ms", config.monitor.interval_ms);
        println!("   History: {} samples", config.monitor.history_capacity);
        println!();
        println!("🔐 Session: {}", storage_key(config.session.storage));
        println!();
    }
}

pub fn storage_key(kind: StorageKind) -> &'static str {
    match kind {
        StorageKind::File => "file",
        StorageKind::Keyring => "keyring",
        StorageKind::Memory => "memory",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_assessment_is_untouched() {
        let form = AssessmentForm {
            age: Some(40),
            ..Default::default()
        };
        let completed = complete_assessment(form, false).unwrap();
        assert_eq!(completed.age, Some(40));
        assert!(completed.gender.is_none());
    }

    #[test]
    fn test_supplied_credentials_skip_prompts() {
        let form = login_form(Some("alice".into()), Some("secret123".into())).unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, "secret123");

        let form = register_form(Some("bob".into()), Some("hunter2hunter2".into())).unwrap();
        assert_eq!(form.password, form.confirm);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(storage_key(StorageKind::File), "file");
        assert_eq!(storage_key(StorageKind::Keyring), "keyring");
        assert_eq!(storage_key(StorageKind::Memory), "memory");
    }
}
