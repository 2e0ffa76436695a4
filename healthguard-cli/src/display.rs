//! Terminal rendering for the CLI

use colored::*;
use healthguard_client::controllers::{AssessmentResult, CheckinOutcome, DashboardEntry, GuardianView};
use healthguard_client::models::{ChatMessage, ChatRole, CheckinStatus, HistoryRecord, OverallStatus, RecordDetail};
use healthguard_client::monitor::VITAL_RANGES;
use healthguard_client::{MonitorSnapshot, Notice, NoticeLevel, Notifier};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".bright_green().to_string()
    } else {
        "no".bright_black().to_string()
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Notices go to stdout, colored by level and stamped with their time
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn line(notice: &Notice) -> String {
        let time = notice.at.format("%H:%M:%S").to_string();
        let message = match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => notice.message.normal(),
            NoticeLevel::Warning => notice.message.yellow(),
            NoticeLevel::Error => notice.message.bright_red(),
        };
        format!("{} {}", time.bright_black(), message)
    }
}

impl Notifier for ConsoleNotifier {
    fn show(&self, notice: &Notice) {
        let symbol = match notice.level {
            NoticeLevel::Success => "✓".bright_green(),
            NoticeLevel::Info => "→".bright_blue(),
            NoticeLevel::Warning => "⚠".yellow(),
            NoticeLevel::Error => "✗".bright_red(),
        };
        println!("  {} {}", symbol, Self::line(notice));
    }
}

pub fn dashboard(greeting: &str, entries: &[DashboardEntry]) {
    section(greeting);
    for entry in entries {
        println!(
            "  {:<20} {:<10} {}",
            entry.title.bright_white(),
            entry.route.path().bright_black(),
            entry.description
        );
    }
}

pub fn assessment(result: &AssessmentResult) {
    section("Assessment Result");
    labeled("BMI", &format!("{:.1} ({})", result.bmi, result.bmi_category().label()));
    labeled("Diabetes risk", &result.diabetes.risk_tag());
    labeled("Heart disease risk", &result.heart.risk_tag());
    match &result.advice {
        Some(advice) => {
            println!();
            println!("  {}", "AI health advice".bright_white().bold());
            for line in advice.lines() {
                println!("    {}", line);
            }
        }
        None => warning("No AI advice available this time"),
    }
}

pub fn history(records: &[HistoryRecord]) {
    section("Health History");
    if records.is_empty() {
        info("No assessments recorded yet");
        return;
    }
    println!("  {:<8} {:<26} {}", "ID".bright_white(), "Time".bright_white(), "User".bright_white());
    for record in records {
        println!("  {:<8} {:<26} {}", record.id, record.timestamp, record.user_id);
    }
}

pub fn record(detail: &RecordDetail) {
    section(&format!("Record #{}", detail.id.map(|id| id.to_string()).unwrap_or_default()));
    labeled("Time", or_dash(detail.timestamp.as_deref()));
    println!();
    println!("  {}", "Form".bright_white().bold());
    for (key, value) in &detail.form_data {
        kv(key, &value.to_string());
    }
    println!();
    println!("  {}", "Predictions".bright_white().bold());
    for key in ["diabetes", "heart"] {
        match detail.prediction(key) {
            Some(p) => kv(key, &p.risk_tag()),
            None => kv(key, "-"),
        }
    }
}

fn status_label(status: OverallStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        OverallStatus::Normal => text.bright_green(),
        OverallStatus::Warning => text.yellow(),
        OverallStatus::Danger => text.bright_red().bold(),
        OverallStatus::Disconnected => text.bright_black(),
    }
}

fn reading(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())
}

/// Reference ranges shown above the live table
pub fn vital_ranges() {
    for range in &VITAL_RANGES {
        kv(range.label, &format!("{} {}", range.range, range.unit));
    }
    println!();
}

/// One line per poll: status, the latest vitals, then alerts
pub fn vitals_row(snapshot: &MonitorSnapshot) {
    let status = status_label(snapshot.summary.overall_status);
    let Some(sample) = snapshot.latest() else {
        println!("  {:<22} waiting for data...", status);
        return;
    };
    let blood_pressure = match (sample.systolic_bp, sample.diastolic_bp) {
        (None, None) => "-".to_string(),
        (sys, dia) => format!("{}/{}", reading(sys), reading(dia)),
    };
    println!(
        "  {:<22} {:<10} HR {:>6}  SpO2 {:>5}  T {:>5}  BP {:<12} {}",
        status,
        sample.timestamp.bright_black(),
        reading(sample.heart_rate),
        reading(sample.blood_oxygen),
        reading(sample.temperature),
        blood_pressure,
        snapshot.summary.alerts.join("; ").yellow()
    );
}

pub fn checkin_status(status: &CheckinStatus) {
    section("Daily Check-in");
    labeled("Checked in today", &yes_no(status.checked_in_today));
    labeled("Total days", &status.total.to_string());
    labeled("Streak", &status.streak.to_string());
    if let Some(mood) = &status.today_mood {
        labeled("Today's mood", mood);
    }
    if !status.recent.is_empty() {
        labeled("Recent", &status.recent.join(", "));
    }
}

pub fn checkin_outcome(outcome: &CheckinOutcome) {
    match outcome {
        CheckinOutcome::CheckedIn { quote, .. } => {
            println!();
            println!("  {}", format!("\"{}\"", quote).italic().bright_cyan());
        }
        CheckinOutcome::AlreadyDone { message } => info(message),
    }
}

pub fn guardian(view: &GuardianView) {
    section("Guardian");
    let config = &view.config;
    labeled("Alerts enabled", &yes_no(config.enabled));
    labeled("Contact", or_dash(config.contact_name.as_deref()));
    labeled("Email", or_dash(config.contact_email.as_deref()));
    labeled("Phone", or_dash(config.contact_phone.as_deref()));
    labeled(
        "Heart rate above",
        &config.threshold_hr_high.map(|v| format!("{} bpm", v)).unwrap_or_else(|| "-".into()),
    );
    labeled(
        "Systolic above",
        &config.threshold_bp_sys.map(|v| format!("{} mmHg", v)).unwrap_or_else(|| "-".into()),
    );

    println!();
    println!("  {}", "Alert log".bright_white().bold());
    if view.logs.is_empty() {
        info("No alerts sent yet");
    }
    for log in &view.logs {
        let status = if log.is_sent() {
            log.status.bright_green()
        } else {
            log.status.bright_red()
        };
        println!(
            "  {:<26} {:<14} {:<12} {}",
            log.timestamp.bright_black(),
            log.alert_type,
            log.alert_value,
            status
        );
    }
}

pub fn chat_message(message: &ChatMessage) {
    match message.role {
        ChatRole::User => println!("  {} {}", "you ›".bright_blue().bold(), message.content),
        ChatRole::Assistant => println!("  {} {}", "bot ›".bright_green().bold(), message.content),
        ChatRole::System => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_line_carries_time_and_message() {
        let mut notice = Notice::new(NoticeLevel::Warning, "Deleted");
        notice.at = "2026-10-16T08:30:05Z".parse().unwrap();

        let line = ConsoleNotifier::line(&notice);
        assert!(line.contains("08:30:05"));
        assert!(line.contains("Deleted"));
    }
}
