//! Escalation state
//!
//! Attempt count plus the values derived from it. Transitions are pure:
//! `advance` takes a state and returns the next one.

use serde::{Deserialize, Serialize};

use crate::config::{ControlSize, EvasionConfig, Visual};

/// Where the evasive control stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscalationState {
    /// Completed "No" activations
    pub attempt_count: u32,
    /// Latched once `attempt_count` reaches `max_attempts`
    pub is_terminal: bool,
    /// A reposition is in flight
    pub is_transitioning: bool,
}

/// Coarse phase, derived from the count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Escalating(u32),
    Terminal,
}

impl EscalationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (self.is_terminal, self.attempt_count) {
            (true, _) => Phase::Terminal,
            (false, 0) => Phase::Idle,
            (false, n) => Phase::Escalating(n),
        }
    }

    /// Count one more activation. A terminal state is returned unchanged.
    pub fn advance(self, max_attempts: u32) -> Self {
        if self.is_terminal {
            return self;
        }
        let attempt_count = self.attempt_count.saturating_add(1);
        Self {
            attempt_count,
            is_terminal: attempt_count >= max_attempts,
            is_transitioning: self.is_transitioning,
        }
    }
}

/// Message for the evasive control
pub fn derived_text<'a>(state: &EscalationState, config: &'a EvasionConfig) -> &'a str {
    config.content.message(state.attempt_count)
}

/// Imagery for the current step
pub fn derived_visual<'a>(state: &EscalationState, config: &'a EvasionConfig) -> &'a Visual {
    config.content.visual(state.attempt_count)
}

/// Accept control size: geometric growth for the box, linear for the font
pub fn derived_yes_size(state: &EscalationState, config: &EvasionConfig) -> ControlSize {
    let yes = &config.yes;
    let n = state.attempt_count.min(i32::MAX as u32) as i32;
    let scale = yes.growth_factor.powi(n);
    let grow = |initial: f32, max: f32| (initial * scale).min(max).max(initial);
    ControlSize {
        width: grow(yes.initial.width, yes.max.width),
        height: grow(yes.initial.height, yes.max.height),
        font_size: (yes.initial.font_size + state.attempt_count as f32 * yes.font_step)
            .min(yes.max.font_size)
            .max(yes.initial.font_size),
    }
}

/// Movement speed, clamped to `[base_speed, max_speed]`
pub fn derived_speed(state: &EscalationState, config: &EvasionConfig) -> f32 {
    let m = &config.movement;
    (m.base_speed + state.attempt_count as f32 * m.speed_increment)
        .min(m.max_speed)
        .max(m.base_speed)
}

/// Transition duration for a reposition. Shrinks as speed grows, never below the floor.
pub fn transition_ms(state: &EscalationState, config: &EvasionConfig) -> u32 {
    let m = &config.movement;
    let speed = derived_speed(state, config);
    let scaled = m.transition_ms as f32 * m.base_speed / speed;
    (scaled.round() as u32)
        .min(m.transition_ms)
        .max(m.min_transition_ms.min(m.transition_ms))
}

/// Delay before a hover re-check
pub fn hover_delay_ms(state: &EscalationState, config: &EvasionConfig) -> u32 {
    let m = &config.movement;
    m.hover_base_delay_ms
        .saturating_sub(state.attempt_count.saturating_mul(m.hover_delay_step_ms))
        .max(m.hover_min_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(count: u32) -> EscalationState {
        EscalationState {
            attempt_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_advance_latches_terminal() {
        let config = EvasionConfig::default();
        let mut state = EscalationState::new();
        assert_eq!(state.phase(), Phase::Idle);

        for n in 1..15 {
            state = state.advance(config.max_attempts);
            assert_eq!(state.attempt_count, n);
            assert!(!state.is_terminal);
            assert_eq!(state.phase(), Phase::Escalating(n));
        }

        state = state.advance(config.max_attempts);
        assert_eq!(state.attempt_count, 15);
        assert!(state.is_terminal);
        assert_eq!(state.phase(), Phase::Terminal);
    }

    #[test]
    fn test_terminal_advance_is_idempotent() {
        let config = EvasionConfig::default();
        let terminal = at(14).advance(config.max_attempts);
        assert!(terminal.is_terminal);

        let mut again = terminal;
        for _ in 0..10 {
            again = again.advance(config.max_attempts);
        }
        assert_eq!(again, terminal);
        assert_eq!(derived_text(&again, &config), derived_text(&terminal, &config));
        assert_eq!(
            derived_yes_size(&again, &config),
            derived_yes_size(&terminal, &config)
        );
        assert_eq!(derived_speed(&again, &config), derived_speed(&terminal, &config));
    }

    #[test]
    fn test_derived_text_and_visual_follow_count() {
        let config = EvasionConfig::default();
        assert_eq!(derived_text(&at(0), &config), "No");
        assert_eq!(derived_text(&at(1), &config), "Sure?");
        assert_eq!(derived_visual(&at(1), &config).fallback, "🤔");
        // Past the end the last entry repeats
        assert_eq!(derived_text(&at(40), &config), derived_text(&at(14), &config));
    }

    #[test]
    fn test_yes_size_growth_and_cap() {
        let config = EvasionConfig::default();
        let initial = derived_yes_size(&at(0), &config);
        assert_eq!(initial, config.yes.initial);

        let one = derived_yes_size(&at(1), &config);
        assert!((one.width - 112.0).abs() < 0.01);
        assert!((one.height - 53.76).abs() < 0.01);
        assert_eq!(one.font_size, 23.0);

        let huge = derived_yes_size(&at(100), &config);
        assert_eq!(huge, config.yes.max);
    }

    #[test]
    fn test_speed_and_transition() {
        let config = EvasionConfig::default();
        assert_eq!(derived_speed(&at(0), &config), 150.0);
        assert_eq!(derived_speed(&at(5), &config), 250.0);
        assert_eq!(derived_speed(&at(50), &config), 400.0);

        assert_eq!(transition_ms(&at(0), &config), 300);
        assert_eq!(transition_ms(&at(5), &config), 180);
        assert_eq!(transition_ms(&at(50), &config), 113);
    }

    #[test]
    fn test_hover_delay_floor() {
        let config = EvasionConfig::default();
        assert_eq!(hover_delay_ms(&at(3), &config), 240);
        assert_eq!(hover_delay_ms(&at(10), &config), 100);
        assert_eq!(hover_delay_ms(&at(14), &config), 100);
    }

    proptest! {
        #[test]
        fn prop_escalation_is_monotonic(a in 0u32..15, b in 0u32..15) {
            let config = EvasionConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (lo, hi) = (at(lo), at(hi));

            let (small, big) = (derived_yes_size(&lo, &config), derived_yes_size(&hi, &config));
            prop_assert!(big.width >= small.width);
            prop_assert!(big.font_size >= small.font_size);
            prop_assert!(derived_speed(&hi, &config) >= derived_speed(&lo, &config));
            prop_assert!(transition_ms(&hi, &config) <= transition_ms(&lo, &config));
        }
    }
}
