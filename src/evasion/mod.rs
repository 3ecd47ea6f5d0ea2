//! Evasion engine
//!
//! Everything that decides how the "No" control behaves. This module is pure
//! and deterministic given its inputs:
//! - Randomness only through an injected `Rng`
//! - Time only through an injected `Scheduler`
//! - The page only through the `Stage` traits

pub mod controller;
pub mod escalation;
pub mod geometry;
pub mod guard;
pub mod schedule;
pub mod stage;

pub use controller::{EvasionController, NoControl};
pub use escalation::{
    EscalationState, Phase, derived_speed, derived_text, derived_visual, derived_yes_size,
    hover_delay_ms, transition_ms,
};
pub use geometry::{Margins, Placement, PlacementRequest, Rect, Size, ValidRange, solve};
pub use guard::reconcile;
pub use schedule::{Scheduler, Task, VirtualClock};
pub use stage::{
    AcceptanceSink, Celebration, Command, Control, Renderer, ScriptedStage, Stage, Viewport,
};
