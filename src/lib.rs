//! Be Mine - the Valentine proposal page with a "No" button that will not be caught
//!
//! Core modules:
//! - `evasion`: Deterministic escalation/placement engine (state, geometry, controller)
//! - `config`: Data-driven page content and tuning
//! - `plan`: The answer and date plan handed off after "Yes"
//! - `summary`: End-of-flow summary for the email form
//! - `platform`: Browser bindings for the engine's collaborators

pub mod config;
pub mod evasion;
pub mod plan;
pub mod platform;
pub mod summary;

pub use config::{ConfigError, EvasionConfig, PageConfig};
pub use evasion::{EscalationState, EvasionController};
pub use plan::DatePlan;

/// Fixed timings not worth configuring
pub mod consts {
    /// Transition used when a resize pulls the control back into view (ms)
    pub const RESIZE_TRANSITION_MS: u32 = 200;
    /// Duration of the accept control's pulse animation (ms)
    pub const PULSE_MS: u32 = 500;
    /// Particles in the terminal heart burst
    pub const BURST_PARTICLES: usize = 20;
    /// Lifetime of a burst particle (ms)
    pub const BURST_LIFETIME_MS: u32 = 1000;
}
