//! Evasion controller
//!
//! Owns the escalation state and is the only thing that writes it. Every
//! interaction arrives here as an event; every effect leaves as a command to
//! the stage or a task for the scheduler.
//!
//! Deferred tasks are checked against the state when they run, not when they
//! were scheduled, so a superseded task quietly does nothing.

use rand::Rng;

use super::escalation::{self, EscalationState};
use super::geometry::{self, Placement, PlacementRequest, Rect};
use super::guard;
use super::schedule::{Scheduler, Task, VirtualClock};
use super::stage::{AcceptanceSink, Control, Stage};
use crate::config::EvasionConfig;
use crate::consts::RESIZE_TRANSITION_MS;

/// Lifecycle of the evasive control on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoControl {
    Present,
    /// Terminal sequence started, waiting for detach
    Leaving,
    Gone,
}

pub struct EvasionController<P, S, G> {
    config: EvasionConfig,
    state: EscalationState,
    stage: P,
    scheduler: S,
    rng: G,
    no_control: NoControl,
    /// Pointer is over the evasive control (tracked from enter/leave events)
    pointer_over: bool,
    /// The control has been repositioned at least once
    moved: bool,
    movement_allowed: bool,
    accepted: bool,
}

impl<P: Stage, S: Scheduler, G: Rng> EvasionController<P, S, G> {
    pub fn new(config: EvasionConfig, stage: P, scheduler: S, rng: G) -> Self {
        let bounds = stage.bounds();
        let movement_allowed = config.movement_allowed(bounds.width, stage.is_touch());
        log::info!(
            "Evasion controller ready: max_attempts={}, movement {}",
            config.max_attempts,
            if movement_allowed { "on" } else { "off" }
        );
        Self {
            config,
            state: EscalationState::new(),
            stage,
            scheduler,
            rng,
            no_control: NoControl::Present,
            pointer_over: false,
            moved: false,
            movement_allowed,
            accepted: false,
        }
    }

    /// Show the opening text, imagery and accept size
    pub fn start(&mut self) {
        let text = escalation::derived_text(&self.state, &self.config);
        self.stage.set_text(Control::No, text);
        self.stage
            .set_visual(escalation::derived_visual(&self.state, &self.config));
        self.stage.set_size(
            Control::Yes,
            escalation::derived_yes_size(&self.state, &self.config),
        );
    }

    pub fn state(&self) -> &EscalationState {
        &self.state
    }

    pub fn config(&self) -> &EvasionConfig {
        &self.config
    }

    pub fn stage(&self) -> &P {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut P {
        &mut self.stage
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn no_control(&self) -> NoControl {
        self.no_control
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn movement_allowed(&self) -> bool {
        self.movement_allowed
    }

    /// "No" was clicked. Always advances, wherever the control is.
    pub fn on_activate(&mut self) {
        if self.accepted || self.state.is_terminal {
            log::debug!("Activation ignored (accepted or terminal)");
            return;
        }

        self.state = self.state.advance(self.config.max_attempts);
        log::info!("No activated! Count: {}", self.state.attempt_count);

        if self.state.is_terminal {
            self.begin_removal();
            return;
        }

        let text = escalation::derived_text(&self.state, &self.config);
        self.stage.set_text(Control::No, text);
        self.stage
            .set_visual(escalation::derived_visual(&self.state, &self.config));
        let size = escalation::derived_yes_size(&self.state, &self.config);
        self.stage.set_size(Control::Yes, size);
        self.stage.pulse(Control::Yes);
        log::debug!(
            "Button text: {text}, yes size {:.0}x{:.0}",
            size.width,
            size.height
        );

        if self.movement_allowed {
            self.scheduler
                .schedule(self.config.movement.settle_delay_ms, Task::Reposition);
        }
    }

    /// Pointer entered the evasive control
    pub fn on_pointer_enter(&mut self) {
        self.pointer_over = true;
        if !self.can_move() || self.state.is_transitioning {
            return;
        }
        // Easy to hit during the first few attempts
        if self.state.attempt_count < self.config.movement.hover_grace {
            return;
        }
        let delay = escalation::hover_delay_ms(&self.state, &self.config);
        self.scheduler.schedule(delay, Task::HoverCheck);
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer_over = false;
    }

    /// Window resized: re-check mobile mode and pull the control back into view
    pub fn on_resize(&mut self) {
        let bounds = self.stage.bounds();
        let allowed = self
            .config
            .movement_allowed(bounds.width, self.stage.is_touch());
        if allowed != self.movement_allowed {
            log::info!("Movement {}", if allowed { "enabled" } else { "disabled" });
            self.movement_allowed = allowed;
        }

        if !self.moved || self.state.is_terminal || self.accepted {
            return;
        }
        if self.no_control != NoControl::Present {
            return;
        }
        let Some(rect) = self.stage.rect(Control::No) else {
            return;
        };
        if let Some(pos) = guard::reconcile(&rect, bounds, self.config.movement.margins) {
            self.stage
                .set_position(Control::No, pos, RESIZE_TRANSITION_MS);
            log::info!(
                "Button repositioned to: ({}, {}) after resize to {}x{}",
                pos.x,
                pos.y,
                bounds.width,
                bounds.height
            );
        }
    }

    /// A deferred task is due
    pub fn on_task(&mut self, task: Task) {
        match task {
            Task::Reposition => self.reposition(),
            Task::HoverCheck => {
                if self.pointer_over && !self.state.is_transitioning {
                    self.reposition();
                }
            }
            Task::TransitionEnd => self.state.is_transitioning = false,
            Task::Detach => self.detach(),
        }
    }

    /// "Yes" was clicked. Hands the count to `sink` exactly once.
    pub fn on_accept(&mut self, sink: &mut dyn AcceptanceSink) -> bool {
        if self.accepted {
            return false;
        }
        self.accepted = true;
        log::info!(
            "Yes clicked after {} no clicks! 🎉",
            self.state.attempt_count
        );
        sink.record_acceptance(self.state.attempt_count);

        self.stage.hide_controls();
        self.stage.set_prompt(&self.config.acceptance.message);
        self.stage.set_visual(&self.config.acceptance.visual);
        let bounds = self.stage.bounds();
        self.stage
            .trigger(glam::Vec2::new(bounds.width / 2.0, bounds.height / 2.0));
        true
    }

    fn can_move(&self) -> bool {
        self.movement_allowed
            && !self.accepted
            && !self.state.is_terminal
            && self.no_control == NoControl::Present
    }

    fn reposition(&mut self) {
        if !self.can_move() {
            return;
        }
        if self.state.is_transitioning {
            log::debug!("Reposition dropped: transition in flight");
            return;
        }
        let Some(rect) = self.stage.rect(Control::No) else {
            log::debug!("Reposition dropped: no button on the page");
            return;
        };

        let movement = &self.config.movement;
        let container = self.stage.bounds();
        let movable = rect.size().max(movement.min_measured);
        let obstacle = self
            .stage
            .rect(Control::Yes)
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0));
        let request = PlacementRequest {
            container,
            movable,
            obstacle,
            margins: movement.margins,
            safe_zone: movement.safe_zone,
            max_attempts: movement.placement_attempts,
        };

        match geometry::solve(&request, &mut self.rng) {
            Placement::NoRoom => {
                log::warn!(
                    "Viewport too small for button movement ({}x{}) - keeping button in place",
                    container.width,
                    container.height
                );
            }
            Placement::At(pos) => {
                let duration = escalation::transition_ms(&self.state, &self.config);
                self.state.is_transitioning = true;
                self.moved = true;
                self.stage.set_position(Control::No, pos, duration);
                self.scheduler.schedule(
                    duration + self.config.movement.transition_grace_ms,
                    Task::TransitionEnd,
                );
                log::info!(
                    "Button moved to: ({}, {}) in {}ms, viewport {}x{}",
                    pos.x,
                    pos.y,
                    duration,
                    container.width,
                    container.height
                );
            }
        }
    }

    /// Terminal sequence, first half. Runs once.
    fn begin_removal(&mut self) {
        if self.no_control != NoControl::Present {
            return;
        }
        self.no_control = NoControl::Leaving;
        log::info!("Removing No button after {} attempts 💕", self.state.attempt_count);

        let rect = self.stage.rect(Control::No);
        self.stage.freeze(Control::No);
        if let Some(rect) = rect {
            self.stage.trigger(rect.center());
        }
        self.stage
            .set_visual(escalation::derived_visual(&self.state, &self.config));
        self.stage
            .emphasize(Control::Yes, self.config.terminal.yes_scale);
        self.stage.set_prompt(&self.config.terminal.prompt);
        self.scheduler
            .schedule(self.config.terminal.detach_delay_ms, Task::Detach);
    }

    /// Terminal sequence, second half
    fn detach(&mut self) {
        if self.no_control != NoControl::Leaving {
            return;
        }
        self.no_control = NoControl::Gone;
        self.stage.remove(Control::No);
        if !self.accepted {
            self.stage
                .replace_with_message(Control::No, &self.config.terminal.closing_message);
        }
    }
}

impl<P: Stage, G: Rng> EvasionController<P, VirtualClock, G> {
    /// Advance the virtual clock by `ms`, running every task that falls due
    pub fn advance_clock(&mut self, ms: u64) {
        let until = self.scheduler.now_ms() + ms;
        while let Some(task) = self.scheduler.pop_due(until) {
            self.on_task(task);
        }
        self.scheduler.set_now(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evasion::geometry::{Size, ValidRange};
    use crate::evasion::stage::{Command, Renderer, ScriptedStage, Viewport};
    use crate::evasion::Phase;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    type TestController = EvasionController<ScriptedStage, VirtualClock, Pcg32>;

    fn controller_with(config: EvasionConfig, stage: ScriptedStage) -> TestController {
        EvasionController::new(config, stage, VirtualClock::new(), Pcg32::seed_from_u64(12345))
    }

    fn desktop() -> TestController {
        controller_with(
            EvasionConfig::default(),
            ScriptedStage::new(Size::new(1280.0, 800.0)),
        )
    }

    fn positions(c: &TestController) -> Vec<glam::IVec2> {
        c.stage()
            .commands()
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Position {
                    control: Control::No,
                    pos,
                    ..
                } => Some(*pos),
                _ => None,
            })
            .collect()
    }

    #[derive(Default)]
    struct Recorded(Vec<u32>);

    impl AcceptanceSink for Recorded {
        fn record_acceptance(&mut self, no_count: u32) {
            self.0.push(no_count);
        }
    }

    #[test]
    fn test_start_shows_opening_content() {
        let mut c = desktop();
        c.start();
        let cmds = c.stage().commands();
        assert_eq!(
            cmds[0],
            Command::Text {
                control: Control::No,
                text: "No".to_string()
            }
        );
        assert!(matches!(cmds[1], Command::Visual(_)));
        assert_eq!(c.state().phase(), Phase::Idle);
    }

    #[test]
    fn test_activation_updates_then_moves_after_settle() {
        let mut c = desktop();
        c.on_activate();

        assert_eq!(c.state().attempt_count, 1);
        assert_eq!(
            c.stage().count(|cmd| matches!(cmd, Command::Text { text, .. } if text == "Sure?")),
            1
        );
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Pulse(Control::Yes))), 1);
        // Nothing moves until the settle delay has passed
        assert!(positions(&c).is_empty());

        c.advance_clock(99);
        assert!(positions(&c).is_empty());
        c.advance_clock(1);
        assert_eq!(positions(&c).len(), 1);
        assert!(c.state().is_transitioning);

        // 265ms transition at count 1, plus 50ms grace
        c.advance_clock(314);
        assert!(c.state().is_transitioning);
        c.advance_clock(1);
        assert!(!c.state().is_transitioning);
    }

    #[test]
    fn test_moves_stay_in_bounds_and_clear_of_yes() {
        let mut c = desktop();
        for _ in 0..10 {
            c.on_activate();
            c.advance_clock(1000);
        }
        let moves = positions(&c);
        assert_eq!(moves.len(), 10);

        let bounds = c.stage().bounds();
        let no = c.stage().rect(Control::No).unwrap();
        let range = ValidRange::new(bounds, no.size(), c.config().movement.margins);
        for p in moves {
            let p = p.as_vec2();
            assert!(p.x >= range.min.x && p.x <= range.max.x);
            assert!(p.y >= range.min.y && p.y <= range.max.y);
        }
    }

    #[test]
    fn test_overlapping_repositions_are_dropped() {
        let mut c = desktop();
        c.on_activate();
        c.advance_clock(100);
        assert_eq!(positions(&c).len(), 1);

        // Second activation lands mid-transition: its reposition is a no-op
        c.on_activate();
        c.advance_clock(100);
        assert_eq!(positions(&c).len(), 1);
        assert_eq!(c.state().attempt_count, 2);
    }

    #[test]
    fn test_hover_ignored_during_grace_period() {
        let mut c = desktop();
        c.on_activate();
        c.on_activate();
        c.advance_clock(1000);
        let before = positions(&c).len();

        c.on_pointer_enter();
        assert!(c.scheduler().is_idle());
        c.advance_clock(1000);
        assert_eq!(positions(&c).len(), before);
    }

    #[test]
    fn test_hover_moves_only_if_pointer_stays() {
        let mut c = desktop();
        for _ in 0..3 {
            c.on_activate();
            c.advance_clock(1000);
        }
        let before = positions(&c).len();

        // Leaves before the 240ms re-check
        c.on_pointer_enter();
        c.advance_clock(100);
        c.on_pointer_leave();
        c.advance_clock(1000);
        assert_eq!(positions(&c).len(), before);

        // Stays on it
        c.on_pointer_enter();
        c.advance_clock(239);
        assert_eq!(positions(&c).len(), before);
        c.advance_clock(1);
        assert_eq!(positions(&c).len(), before + 1);
    }

    #[test]
    fn test_hover_check_skipped_while_transitioning() {
        let mut c = desktop();
        for _ in 0..5 {
            c.on_activate();
            c.advance_clock(1000);
        }
        // Delay at count 5 is 200ms; settle is 100ms so the click move wins
        c.on_pointer_enter();
        c.on_activate();
        c.advance_clock(100);
        let after_click = positions(&c).len();
        c.advance_clock(100);
        assert_eq!(positions(&c).len(), after_click);
    }

    #[test]
    fn test_mobile_never_moves() {
        let mut c = controller_with(
            EvasionConfig::default(),
            ScriptedStage::new(Size::new(1280.0, 800.0)).with_touch(true),
        );
        assert!(!c.movement_allowed());
        for _ in 0..5 {
            c.on_activate();
            c.on_pointer_enter();
            c.advance_clock(1000);
        }
        assert!(positions(&c).is_empty());
        assert_eq!(c.state().attempt_count, 5);
    }

    #[test]
    fn test_degenerate_viewport_keeps_position() {
        let mut c = controller_with(
            EvasionConfig {
                mobile: crate::config::Mobile {
                    disable_movement: false,
                    ..Default::default()
                },
                ..Default::default()
            },
            ScriptedStage::new(Size::new(150.0, 150.0)),
        );
        let before = c.stage().rect(Control::No);
        c.on_activate();
        c.advance_clock(1000);
        assert!(positions(&c).is_empty());
        assert!(!c.state().is_transitioning);
        assert_eq!(c.stage().rect(Control::No), before);
    }

    #[test]
    fn test_missing_control_is_noop() {
        let mut c = controller_with(
            EvasionConfig::default(),
            ScriptedStage::new(Size::new(1280.0, 800.0)).with_controls(None, None),
        );
        c.on_activate();
        c.advance_clock(1000);
        assert!(positions(&c).is_empty());
        assert_eq!(c.state().attempt_count, 1);
    }

    #[test]
    fn test_fifteen_activations_scenario() {
        let mut c = desktop();
        let config = c.config().clone();

        for n in 1..15u32 {
            c.stage_mut().take_commands();
            c.on_activate();
            assert!(!c.state().is_terminal, "activation {n} must not be terminal");
            let expected = config.content.message(n).to_string();
            let shown = c
                .stage()
                .count(|cmd| matches!(cmd, Command::Text { text, .. } if *text == expected));
            assert_eq!(shown, 1);
            c.advance_clock(1000);
        }

        c.stage_mut().take_commands();
        let last_center = c.stage().rect(Control::No).unwrap().center();
        c.on_activate();
        assert!(c.state().is_terminal);
        assert_eq!(c.no_control(), NoControl::Leaving);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Freeze(Control::No))), 1);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Celebrate(_))), 1);
        // Anchored at where the control was last seen
        let burst = Command::Celebrate(last_center);
        assert_eq!(c.stage().count(|cmd| *cmd == burst), 1);
        assert_eq!(
            c.stage().count(|cmd| matches!(cmd, Command::Emphasize { control: Control::Yes, .. })),
            1
        );

        // Not detached until the delay has passed
        c.advance_clock(1999);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Remove(_))), 0);
        c.advance_clock(1);
        assert_eq!(c.no_control(), NoControl::Gone);
        assert_eq!(c.stage().rect(Control::No), None);

        // 16th activation changes nothing
        let state = *c.state();
        c.on_activate();
        c.on_pointer_enter();
        c.advance_clock(5000);
        assert_eq!(*c.state(), state);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Freeze(_))), 1);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Remove(_))), 1);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::Message { .. })), 1);
    }

    #[test]
    fn test_pending_reposition_dropped_after_terminal() {
        let mut config = EvasionConfig::default();
        config.max_attempts = 2;
        let mut c = controller_with(config, ScriptedStage::new(Size::new(1280.0, 800.0)));
        c.on_activate();
        // Terminal before the settle delay elapses
        c.on_activate();
        c.advance_clock(5000);
        assert!(positions(&c).is_empty());
    }

    #[test]
    fn test_resize_pulls_control_back() {
        let mut c = desktop();
        c.on_activate();
        c.advance_clock(1000);
        c.stage_mut()
            .set_position(Control::No, glam::IVec2::new(1100, 700), 0);

        c.stage_mut().set_bounds(Size::new(1000.0, 700.0));
        c.on_resize();
        let fixed = c.stage().rect(Control::No).unwrap();
        assert_eq!((fixed.left, fixed.top), (860.0, 610.0));

        // Already in bounds: nothing new issued
        let count = positions(&c).len();
        c.stage_mut().set_bounds(Size::new(2000.0, 2000.0));
        c.on_resize();
        assert_eq!(positions(&c).len(), count);
    }

    #[test]
    fn test_resize_before_first_move_is_noop() {
        let mut c = desktop();
        c.stage_mut().set_bounds(Size::new(900.0, 300.0));
        c.on_resize();
        assert!(positions(&c).is_empty());
    }

    #[test]
    fn test_resize_to_mobile_width_disables_movement() {
        let mut c = desktop();
        c.stage_mut().set_bounds(Size::new(700.0, 800.0));
        c.on_resize();
        assert!(!c.movement_allowed());
        c.on_activate();
        c.advance_clock(1000);
        assert!(positions(&c).is_empty());
    }

    #[test]
    fn test_accept_hands_off_count_once() {
        let mut c = desktop();
        for _ in 0..4 {
            c.on_activate();
        }
        let mut sink = Recorded::default();
        assert!(c.on_accept(&mut sink));
        assert!(!c.on_accept(&mut sink));
        assert_eq!(sink.0, vec![4]);

        c.on_activate();
        assert_eq!(c.state().attempt_count, 4);
        assert_eq!(c.stage().count(|cmd| matches!(cmd, Command::HideControls)), 1);
    }

    #[test]
    fn test_same_seed_same_session() {
        let run = || {
            let mut c = desktop();
            for _ in 0..6 {
                c.on_activate();
                c.advance_clock(500);
            }
            positions(&c)
        };
        assert_eq!(run(), run());
    }
}
