//! End-of-flow summary
//!
//! Builds the message and form payload describing the finished plan, plus the
//! countdown to the chosen date. Sending it is left to the page.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{PageConfig, SelectionOption};
use crate::plan::DatePlan;

/// Form backends the payload is shaped for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Formspree,
    Formsubmit,
}

/// Email summary settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub provider: Provider,
    pub formspree_id: Option<String>,
    pub recipient: Option<String>,
    pub subject: String,
    pub success_message: String,
    pub error_message: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: Provider::Formspree,
            formspree_id: None,
            recipient: None,
            subject: "Our Valentine Plan 💕".to_string(),
            success_message: "Summary sent! Check your inbox 💌".to_string(),
            error_message: "Couldn't send the email. Please try again in a moment.".to_string(),
        }
    }
}

impl EmailConfig {
    /// Form endpoint. Formspree needs an id; otherwise fall back to FormSubmit by recipient.
    pub fn endpoint(&self) -> Option<String> {
        match (&self.provider, &self.formspree_id, &self.recipient) {
            (Provider::Formspree, Some(id), _) if !id.is_empty() => {
                Some(format!("https://formspree.io/f/{id}"))
            }
            (_, _, Some(recipient)) if !recipient.is_empty() => Some(format!(
                "https://formsubmit.co/ajax/{}",
                urlencoding::encode(recipient)
            )),
            _ => None,
        }
    }

    fn uses_formspree(&self) -> bool {
        self.provider == Provider::Formspree
            && self.formspree_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// JSON body posted to the form backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPayload {
    #[serde(rename = "_subject")]
    pub subject: String,
    pub message: String,
    pub date: String,
    pub no_clicks: u32,
    #[serde(rename = "_captcha")]
    pub captcha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Ready-to-send summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub endpoint: String,
    pub payload: FormPayload,
}

/// Map ids to their labels; unknown ids are kept as-is
pub fn labels_for(ids: &[String], options: &[SelectionOption]) -> Vec<String> {
    ids.iter()
        .map(|id| {
            options
                .iter()
                .find(|o| &o.id == id)
                .map_or_else(|| id.clone(), |o| o.label.clone())
        })
        .collect()
}

/// Comma-separated list, or a placeholder when empty
pub fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "None selected".to_string()
    } else {
        items.join(", ")
    }
}

/// Time left until the chosen date. All zero once it has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRemaining {
    /// Milliseconds
    pub total: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_past: bool,
}

pub fn time_remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let total = (target - now).num_milliseconds();
    if total <= 0 {
        return TimeRemaining {
            is_past: true,
            ..Default::default()
        };
    }
    let secs = total / 1000;
    TimeRemaining {
        total,
        days: secs / 86_400,
        hours: secs / 3_600 % 24,
        minutes: secs / 60 % 60,
        seconds: secs % 60,
        is_past: false,
    }
}

fn parse_plan_date(iso: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            log::warn!("Unreadable plan date {iso:?}: {e}");
            None
        }
    }
}

/// `2026-02-14` as `Saturday, February 14, 2026`. Unparseable input is returned as-is.
pub fn format_date(iso: &str) -> String {
    parse_plan_date(iso)
        .map(|d| d.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| iso.to_string())
}

/// Countdown to the start (UTC midnight) of the plan's date, if one was picked
pub fn countdown(plan: &DatePlan, now: DateTime<Utc>) -> Option<TimeRemaining> {
    let date = parse_plan_date(plan.selected_date.as_deref()?)?;
    let target = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(time_remaining(target, now))
}

/// Date line text: the override if given, else the plan's own date
fn date_label(plan: &DatePlan, formatted_date: Option<&str>) -> String {
    match (formatted_date, plan.selected_date.as_deref()) {
        (Some(date), _) => date.to_string(),
        (None, Some(iso)) => format_date(iso),
        (None, None) => "Not selected".to_string(),
    }
}

/// Message body lines for the plan
pub fn summary_lines(
    plan: &DatePlan,
    config: &PageConfig,
    formatted_date: Option<&str>,
) -> Vec<String> {
    let date = date_label(plan, formatted_date);
    let food = labels_for(&plan.selected_food, &config.food_options);
    let dessert = labels_for(&plan.selected_dessert, &config.dessert_options);
    let activities = labels_for(&plan.selected_activities, &config.activity_options);

    vec![
        "Hi! 💌".to_string(),
        "Here's the Valentine date plan straight from the website:".to_string(),
        String::new(),
        format!("📅 Date: {date}"),
        format!("😄 Chase Count: {}", plan.no_click_count),
        format!("🍽️ Food: {}", format_list(&food)),
        format!("🍰 Dessert: {}", format_list(&dessert)),
        format!("🎯 Activities: {}", format_list(&activities)),
        String::new(),
        format!("Final Message: {}", config.final_message),
        String::new(),
        "Sent with 💖 from your Valentine experience.".to_string(),
    ]
}

/// Build the form request, or `None` when email is off or has nowhere to go
pub fn build_request(
    plan: &DatePlan,
    config: &PageConfig,
    formatted_date: Option<&str>,
) -> Option<SummaryRequest> {
    let email = &config.email;
    if !email.enabled {
        log::info!("Email not enabled in config");
        return None;
    }
    let Some(endpoint) = email.endpoint() else {
        log::warn!("No valid email configuration found");
        return None;
    };

    let payload = FormPayload {
        subject: email.subject.clone(),
        message: summary_lines(plan, config, formatted_date).join("\n"),
        date: date_label(plan, formatted_date),
        no_clicks: plan.no_click_count,
        captcha: "false".to_string(),
        // Formspree always gets the field, empty when there is no recipient
        email: if email.uses_formspree() {
            Some(email.recipient.clone().unwrap_or_default())
        } else {
            None
        },
    };
    log::debug!("Summary prepared for {endpoint}");
    Some(SummaryRequest { endpoint, payload })
}
