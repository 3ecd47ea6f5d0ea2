//! Collaborator seams
//!
//! The controller drives the page only through these traits. `ScriptedStage`
//! is an in-memory page used by the native runner and the tests.

use glam::{IVec2, Vec2};

use super::geometry::{Rect, Size};
use crate::config::{ControlSize, Visual};

/// The two controls of the proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Accept
    Yes,
    /// Decline (the evasive one)
    No,
}

/// Commands the page must carry out, plus geometry queries
pub trait Renderer {
    fn set_text(&mut self, control: Control, text: &str);
    fn set_visual(&mut self, visual: &Visual);
    fn set_size(&mut self, control: Control, size: ControlSize);
    /// Move `control` so its top-left corner lands on `pos` over `transition_ms`
    fn set_position(&mut self, control: Control, pos: IVec2, transition_ms: u32);
    fn set_prompt(&mut self, text: &str);
    /// Short attention animation
    fn pulse(&mut self, control: Control);
    /// Stop all movement and fade the control out
    fn freeze(&mut self, control: Control);
    fn emphasize(&mut self, control: Control, scale: f32);
    fn remove(&mut self, control: Control);
    /// Show `text` where the control used to be
    fn replace_with_message(&mut self, control: Control, text: &str);
    /// Hide both controls (after acceptance)
    fn hide_controls(&mut self);
    /// Current bounding box, `None` if the control is not on the page
    fn rect(&self, control: Control) -> Option<Rect>;
}

/// Visible area of the page
pub trait Viewport {
    /// Visible extent, excluding any scrollable overflow
    fn bounds(&self) -> Size;

    fn is_touch(&self) -> bool {
        false
    }
}

/// Particle burst
pub trait Celebration {
    fn trigger(&mut self, origin: Vec2);
}

/// Receives the final count once the proposal is accepted
pub trait AcceptanceSink {
    fn record_acceptance(&mut self, no_count: u32);
}

/// Everything the controller needs from the page
pub trait Stage: Renderer + Viewport + Celebration {}

impl<T: Renderer + Viewport + Celebration> Stage for T {}

/// A command as seen by the page
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text { control: Control, text: String },
    Visual(Visual),
    Size { control: Control, size: ControlSize },
    Position { control: Control, pos: IVec2, transition_ms: u32 },
    Prompt(String),
    Pulse(Control),
    Freeze(Control),
    Emphasize { control: Control, scale: f32 },
    Remove(Control),
    Message { control: Control, text: String },
    HideControls,
    Celebrate(Vec2),
}

/// Headless page: keeps control geometry in memory and records every command
#[derive(Debug, Clone)]
pub struct ScriptedStage {
    bounds: Size,
    touch: bool,
    no: Option<Rect>,
    yes: Option<Rect>,
    log: Vec<Command>,
}

impl ScriptedStage {
    /// Page of the given size with the controls side by side in the middle
    pub fn new(bounds: Size) -> Self {
        let mid = Vec2::new(bounds.width / 2.0, bounds.height / 2.0);
        Self {
            bounds,
            touch: false,
            yes: Some(Rect::new(mid.x - 120.0, mid.y - 24.0, mid.x - 20.0, mid.y + 24.0)),
            no: Some(Rect::new(mid.x + 20.0, mid.y - 25.0, mid.x + 120.0, mid.y + 25.0)),
            log: Vec::new(),
        }
    }

    pub fn with_controls(mut self, yes: Option<Rect>, no: Option<Rect>) -> Self {
        self.yes = yes;
        self.no = no;
        self
    }

    pub fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    /// Simulate a window resize (controls keep their place)
    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    pub fn commands(&self) -> &[Command] {
        &self.log
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.log)
    }

    /// Number of recorded commands matching `pred`
    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.log.iter().filter(|c| pred(c)).count()
    }

    fn slot(&mut self, control: Control) -> &mut Option<Rect> {
        match control {
            Control::Yes => &mut self.yes,
            Control::No => &mut self.no,
        }
    }
}

impl Renderer for ScriptedStage {
    fn set_text(&mut self, control: Control, text: &str) {
        self.log.push(Command::Text {
            control,
            text: text.to_string(),
        });
    }

    fn set_visual(&mut self, visual: &Visual) {
        self.log.push(Command::Visual(visual.clone()));
    }

    fn set_size(&mut self, control: Control, size: ControlSize) {
        // Grows around its center
        if let Some(rect) = self.slot(control) {
            let c = rect.center();
            *rect = Rect::new(
                c.x - size.width / 2.0,
                c.y - size.height / 2.0,
                c.x + size.width / 2.0,
                c.y + size.height / 2.0,
            );
        }
        self.log.push(Command::Size { control, size });
    }

    fn set_position(&mut self, control: Control, pos: IVec2, transition_ms: u32) {
        if let Some(rect) = self.slot(control) {
            *rect = Rect::from_origin_size(pos.as_vec2(), rect.size());
        }
        self.log.push(Command::Position {
            control,
            pos,
            transition_ms,
        });
    }

    fn set_prompt(&mut self, text: &str) {
        self.log.push(Command::Prompt(text.to_string()));
    }

    fn pulse(&mut self, control: Control) {
        self.log.push(Command::Pulse(control));
    }

    fn freeze(&mut self, control: Control) {
        self.log.push(Command::Freeze(control));
    }

    fn emphasize(&mut self, control: Control, scale: f32) {
        self.log.push(Command::Emphasize { control, scale });
    }

    fn remove(&mut self, control: Control) {
        *self.slot(control) = None;
        self.log.push(Command::Remove(control));
    }

    fn replace_with_message(&mut self, control: Control, text: &str) {
        self.log.push(Command::Message {
            control,
            text: text.to_string(),
        });
    }

    fn hide_controls(&mut self) {
        self.log.push(Command::HideControls);
    }

    fn rect(&self, control: Control) -> Option<Rect> {
        match control {
            Control::Yes => self.yes,
            Control::No => self.no,
        }
    }
}

impl Viewport for ScriptedStage {
    fn bounds(&self) -> Size {
        self.bounds
    }

    fn is_touch(&self) -> bool {
        self.touch
    }
}

impl Celebration for ScriptedStage {
    fn trigger(&mut self, origin: Vec2) {
        self.log.push(Command::Celebrate(origin));
    }
}
