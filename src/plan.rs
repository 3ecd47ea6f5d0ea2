//! Date plan record
//!
//! What gets carried from the proposal page to the follow-up pages: the answer,
//! how many times "No" was clicked, and the picks made afterwards. Storage is
//! behind `PlanStore`; the record itself is plain serde JSON.

use serde::{Deserialize, Serialize};

use crate::evasion::AcceptanceSink;

/// The answer to the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
}

/// Steps of the flow, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Response,
    Date,
    Food,
    Dessert,
    Activities,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Response,
        Step::Date,
        Step::Food,
        Step::Dessert,
        Step::Activities,
    ];
}

/// Everything recorded across the pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatePlan {
    pub response: Option<Response>,
    /// Unix timestamp (ms) of the "Yes"
    pub accepted_at: Option<f64>,
    pub no_click_count: u32,
    /// ISO date (YYYY-MM-DD)
    pub selected_date: Option<String>,
    pub selected_food: Vec<String>,
    pub selected_dessert: Vec<String>,
    pub selected_activities: Vec<String>,
    pub completed: bool,
}

impl DatePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the "Yes" together with the chase count
    pub fn record_yes(&mut self, no_click_count: u32, timestamp: f64) {
        self.response = Some(Response::Yes);
        self.accepted_at = Some(timestamp);
        self.no_click_count = no_click_count;
        log::info!("Yes recorded after {} no clicks", no_click_count);
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.selected_date = Some(date.into());
    }

    pub fn set_food(&mut self, ids: Vec<String>) {
        self.selected_food = ids;
    }

    pub fn set_dessert(&mut self, ids: Vec<String>) {
        self.selected_dessert = ids;
    }

    pub fn set_activities(&mut self, ids: Vec<String>) {
        self.selected_activities = ids;
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn has_completed(&self, step: Step) -> bool {
        match step {
            Step::Response => self.response == Some(Response::Yes),
            Step::Date => self.selected_date.is_some(),
            Step::Food => !self.selected_food.is_empty(),
            Step::Dessert => !self.selected_dessert.is_empty(),
            Step::Activities => !self.selected_activities.is_empty(),
        }
    }

    /// Completed steps as a rounded percentage
    pub fn progress(&self) -> u32 {
        let done = Step::ALL.iter().filter(|s| self.has_completed(**s)).count();
        ((done as f32 / Step::ALL.len() as f32) * 100.0).round() as u32
    }

    /// Parse a stored plan. Anything unreadable starts fresh.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(plan) => plan,
            Err(e) => {
                log::warn!("Discarding unreadable plan: {e}");
                Self::new()
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Where the plan lives between pages
pub trait PlanStore {
    fn load(&self) -> DatePlan;
    fn save(&mut self, plan: &DatePlan);
    fn clear(&mut self);

    /// Load, apply `f`, save
    fn update(&mut self, f: impl FnOnce(&mut DatePlan))
    where
        Self: Sized,
    {
        let mut plan = self.load();
        f(&mut plan);
        self.save(&plan);
    }
}

/// In-memory store holding the serialized plan
#[derive(Debug, Clone, Default)]
pub struct MemoryPlanStore {
    json: Option<String>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl PlanStore for MemoryPlanStore {
    fn load(&self) -> DatePlan {
        self.json
            .as_deref()
            .map(DatePlan::from_json)
            .unwrap_or_default()
    }

    fn save(&mut self, plan: &DatePlan) {
        self.json = Some(plan.to_json());
        log::debug!("Plan saved");
    }

    fn clear(&mut self) {
        self.json = None;
        log::info!("All plan data cleared");
    }
}

/// Hands the chase count to a store along with the time it happened
pub struct AcceptanceRecorder<'a, S: PlanStore> {
    store: &'a mut S,
    timestamp: f64,
}

impl<'a, S: PlanStore> AcceptanceRecorder<'a, S> {
    pub fn new(store: &'a mut S, timestamp: f64) -> Self {
        Self { store, timestamp }
    }
}

impl<S: PlanStore> AcceptanceSink for AcceptanceRecorder<'_, S> {
    fn record_acceptance(&mut self, no_count: u32) {
        let timestamp = self.timestamp;
        self.store
            .update(|plan| plan.record_yes(no_count, timestamp));
    }
}
