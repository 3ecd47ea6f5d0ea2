//! Page configuration
//!
//! Immutable once handed to the controller. Every field has a default, so a
//! JSON override only needs the keys it changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evasion::geometry::{Margins, Size};
use crate::summary::EmailConfig;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message sequence is empty")]
    EmptyMessages,
    #[error("visual sequence is empty")]
    EmptyVisuals,
    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,
    #[error("growth factor must be >= 1.0, got {0}")]
    InvalidGrowth(f32),
    #[error("accept control max size is smaller than its initial size")]
    InvalidSizes,
    #[error("max_speed must be >= base_speed")]
    InvalidSpeed,
}

/// One step of escalating imagery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    /// Image source
    pub src: String,
    /// Shown when the image fails to load
    pub fallback: String,
}

impl Visual {
    pub fn new(src: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            fallback: fallback.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawContent {
    messages: Vec<String>,
    visuals: Vec<Visual>,
}

/// Escalating messages and imagery, indexed by attempt count.
///
/// Both lists are non-empty; the last entry repeats once a list runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContent")]
pub struct ContentSequence {
    messages: Vec<String>,
    visuals: Vec<Visual>,
}

impl TryFrom<RawContent> for ContentSequence {
    type Error = ConfigError;

    fn try_from(raw: RawContent) -> Result<Self, Self::Error> {
        Self::new(raw.messages, raw.visuals)
    }
}

impl ContentSequence {
    pub fn new(messages: Vec<String>, visuals: Vec<Visual>) -> Result<Self, ConfigError> {
        if messages.is_empty() {
            return Err(ConfigError::EmptyMessages);
        }
        if visuals.is_empty() {
            return Err(ConfigError::EmptyVisuals);
        }
        Ok(Self { messages, visuals })
    }

    pub fn message(&self, index: u32) -> &str {
        let i = (index as usize).min(self.messages.len() - 1);
        &self.messages[i]
    }

    pub fn visual(&self, index: u32) -> &Visual {
        let i = (index as usize).min(self.visuals.len() - 1);
        &self.visuals[i]
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn visuals(&self) -> &[Visual] {
        &self.visuals
    }
}

impl Default for ContentSequence {
    fn default() -> Self {
        let messages = [
            "No",
            "Sure?",
            "Really sure?",
            "Think again!",
            "Pretty please? 🥺",
            "Don't fly away! 🐦",
            "You're breaking my heart 💔",
            "You'll regret this! 💕",
            "I'll cry...",
            "Pretty pls? 🌹",
            "Aww 😢",
            "Look at me 🥺",
            "Last chance!",
            "No escape 💕",
            "Just say YES! 😭",
        ];
        let visuals = [
            ("assets/gifs/image1.gif", "🥺"),
            ("assets/gifs/think.gif", "🤔"),
            ("assets/gifs/image2.gif", "😕"),
            ("assets/gifs/sadface.gif", "😢"),
            ("assets/gifs/image3.gif", "😟"),
            ("assets/gifs/plz.gif", "🙏"),
            ("assets/gifs/image4.gif", "🥺"),
            ("assets/gifs/cry.gif", "😭"),
            ("assets/gifs/image5.gif", "💔"),
            ("assets/gifs/attitude.gif", "😤"),
            ("assets/gifs/cute.gif", "🥹"),
            ("assets/gifs/image6.gif", "🙏"),
            ("assets/gifs/loveme.gif", "💕"),
            ("assets/gifs/angry.gif", "😠"),
            ("assets/gifs/image7.gif", "💖"),
        ];
        Self {
            messages: messages.iter().map(|m| m.to_string()).collect(),
            visuals: visuals
                .iter()
                .map(|(src, fallback)| Visual::new(*src, *fallback))
                .collect(),
        }
    }
}

/// Size of the accept control (box plus font)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSize {
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

impl ControlSize {
    pub const fn new(width: f32, height: f32, font_size: f32) -> Self {
        Self {
            width,
            height,
            font_size,
        }
    }
}

/// Growth of the accept control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YesGrowth {
    pub initial: ControlSize,
    pub max: ControlSize,
    /// Width/height multiplier per attempt
    pub growth_factor: f32,
    /// Font size added per attempt
    pub font_step: f32,
}

impl Default for YesGrowth {
    fn default() -> Self {
        Self {
            initial: ControlSize::new(100.0, 48.0, 20.0),
            max: ControlSize::new(400.0, 200.0, 60.0),
            growth_factor: 1.12,
            font_step: 3.0,
        }
    }
}

/// Movement tuning for the evasive control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movement {
    pub enabled: bool,
    pub base_speed: f32,
    pub speed_increment: f32,
    pub max_speed: f32,
    /// Transition duration at base speed (ms)
    pub transition_ms: u32,
    /// Transition duration floor (ms)
    pub min_transition_ms: u32,
    /// Extra time after a transition before another may start (ms)
    pub transition_grace_ms: u32,
    /// Pause between an activation and the resulting move (ms)
    pub settle_delay_ms: u32,
    /// Activations required before hovering starts to move the control
    pub hover_grace: u32,
    pub hover_base_delay_ms: u32,
    pub hover_delay_step_ms: u32,
    pub hover_min_delay_ms: u32,
    pub margins: Margins,
    /// Minimum clearance from the accept control (px)
    pub safe_zone: f32,
    /// Random draws per placement
    pub placement_attempts: u32,
    /// Floor applied to the measured control size
    pub min_measured: Size,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            enabled: true,
            base_speed: 150.0,
            speed_increment: 20.0,
            max_speed: 400.0,
            transition_ms: 300,
            min_transition_ms: 100,
            transition_grace_ms: 50,
            settle_delay_ms: 100,
            hover_grace: 3,
            hover_base_delay_ms: 300,
            hover_delay_step_ms: 20,
            hover_min_delay_ms: 100,
            margins: Margins::default(),
            safe_zone: 50.0,
            placement_attempts: 20,
            min_measured: Size::new(100.0, 50.0),
        }
    }
}

/// Touch / narrow-screen behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mobile {
    pub disable_movement: bool,
    /// Viewports at or below this width count as mobile (px)
    pub breakpoint: f32,
}

impl Default for Mobile {
    fn default() -> Self {
        Self {
            disable_movement: true,
            breakpoint: 768.0,
        }
    }
}

/// What happens once the evasive control gives up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Terminal {
    /// Delay before the control is detached (ms)
    pub detach_delay_ms: u32,
    /// Scale applied to the accept control
    pub yes_scale: f32,
    pub prompt: String,
    pub closing_message: String,
}

impl Default for Terminal {
    fn default() -> Self {
        Self {
            detach_delay_ms: 2000,
            yes_scale: 1.3,
            prompt: "There's only one answer now! 💕".to_string(),
            closing_message: "💕 \"No\" has left the building! 😎".to_string(),
        }
    }
}

/// Shown once the proposal is accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Acceptance {
    pub message: String,
    pub visual: Visual,
}

impl Default for Acceptance {
    fn default() -> Self {
        Self {
            message: "I knew you would say yes! 💖".to_string(),
            visual: Visual::new("assets/gifs/thanks.gif", "🎉"),
        }
    }
}

/// Everything the evasion controller consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvasionConfig {
    /// Activations before the control is removed
    pub max_attempts: u32,
    pub content: ContentSequence,
    pub yes: YesGrowth,
    pub movement: Movement,
    pub mobile: Mobile,
    pub terminal: Terminal,
    pub acceptance: Acceptance,
}

impl Default for EvasionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            content: ContentSequence::default(),
            yes: YesGrowth::default(),
            movement: Movement::default(),
            mobile: Mobile::default(),
            terminal: Terminal::default(),
            acceptance: Acceptance::default(),
        }
    }
}

impl EvasionConfig {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        let growth = self.yes.growth_factor;
        if growth.is_nan() || growth < 1.0 {
            return Err(ConfigError::InvalidGrowth(self.yes.growth_factor));
        }
        let (initial, max) = (self.yes.initial, self.yes.max);
        if max.width < initial.width
            || max.height < initial.height
            || max.font_size < initial.font_size
        {
            return Err(ConfigError::InvalidSizes);
        }
        if self.movement.max_speed < self.movement.base_speed || self.movement.base_speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed);
        }
        Ok(())
    }

    /// Whether the control may move at all for a viewport of this width
    pub fn movement_allowed(&self, viewport_width: f32, touch: bool) -> bool {
        if !self.movement.enabled {
            return false;
        }
        let mobile = touch || viewport_width <= self.mobile.breakpoint;
        !(mobile && self.mobile.disable_movement)
    }
}

/// A pickable option on one of the selection pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub id: String,
    pub label: String,
    pub image: String,
}

impl SelectionOption {
    pub fn new(id: &str, label: &str, image: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            image: image.to_string(),
        }
    }
}

/// Whole-site configuration: the proposal page plus the follow-up pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub question: String,
    pub final_message: String,
    pub evasion: EvasionConfig,
    pub food_options: Vec<SelectionOption>,
    pub dessert_options: Vec<SelectionOption>,
    pub activity_options: Vec<SelectionOption>,
    pub email: EmailConfig,
}

impl Default for PageConfig {
    fn default() -> Self {
        let opts = |list: &[(&str, &str, &str)]| -> Vec<SelectionOption> {
            list.iter()
                .map(|(id, label, image)| SelectionOption::new(id, label, image))
                .collect()
        };
        Self {
            question: "Will you be my Valentine? 💕".to_string(),
            final_message: "Thank you for being my Valentine! Every moment with you is magical. 💖"
                .to_string(),
            evasion: EvasionConfig::default(),
            food_options: opts(&[
                ("pasta", "Pasta 🍝", "assets/images/pasta.jpeg"),
                ("sushi", "Sushi 🍱", "assets/images/sushi.jpeg"),
                ("korean", "Korean 🥢", "assets/images/koreanfood.jpeg"),
                ("ramen", "Ramen 🍜", "assets/images/ramen.jpeg"),
                ("burger", "Burgers 🍔", "assets/images/burgers.jpeg"),
                ("pizza", "Pizza 🍕", "assets/images/pizza.jpeg"),
                ("salad", "Salad 🥗", "assets/images/salad.jpeg"),
                ("dumplings", "Dumplings 🥟", "assets/images/dumplings.jpeg"),
            ]),
            dessert_options: opts(&[
                ("mochi", "Mochi 🍡", "assets/images/mochi.jpeg"),
                ("icecream", "Ice Cream 🐟", "assets/images/taiyaki.jpeg"),
                ("tiramisu", "Tiramisu 🍨", "assets/images/tiramisu.jpg"),
                ("brownie", "Sizzling Brownie", "assets/images/brownie.jpg"),
                ("boba", "Boba Tea 🧋", "assets/images/boba.jpeg"),
                ("churros", "Churros", "assets/images/churro.jpeg"),
            ]),
            activity_options: opts(&[
                ("cinema", "Movies 🎬", "assets/images/cinema.jpeg"),
                ("aquarium", "Aquarium 🐠", "assets/images/aquarium.jpeg"),
                ("park", "Walk in Park 🌳", "assets/images/park.jpeg"),
                ("arcade", "Arcade 🎮", "assets/images/arcade.jpeg"),
                ("gallery", "Art Exhibition 🖼️", "assets/images/gallery.jpeg"),
                ("cats", "Cat Cafe 🐱", "assets/images/cat.jpg"),
            ]),
            email: EmailConfig::default(),
        }
    }
}

impl PageConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.evasion.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EvasionConfig::default().validate().is_ok());
        assert_eq!(EvasionConfig::default().content.messages().len(), 15);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"max_attempts": 5, "movement": {"safe_zone": 10}}"#;
        let config = EvasionConfig::from_json(json).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.movement.safe_zone, 10.0);
        assert_eq!(config.movement.settle_delay_ms, 100);
        assert_eq!(config.yes.growth_factor, 1.12);
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = EvasionConfig::from_json(r#"{"content": {"messages": [], "visuals": []}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(matches!(
            ContentSequence::new(vec!["No".into()], vec![]),
            Err(ConfigError::EmptyVisuals)
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EvasionConfig::from_json(r#"{"max_attempts": 0}"#),
            Err(ConfigError::ZeroMaxAttempts)
        ));
        assert!(matches!(
            EvasionConfig::from_json(r#"{"yes": {"growth_factor": 0.5}}"#),
            Err(ConfigError::InvalidGrowth(_))
        ));
        assert!(matches!(
            EvasionConfig::from_json(r#"{"movement": {"base_speed": 500}}"#),
            Err(ConfigError::InvalidSpeed)
        ));
    }

    #[test]
    fn test_content_repeats_last_entry() {
        let content = ContentSequence::new(
            vec!["a".into(), "b".into()],
            vec![Visual::new("x.gif", "x")],
        )
        .unwrap();
        assert_eq!(content.message(0), "a");
        assert_eq!(content.message(1), "b");
        assert_eq!(content.message(99), "b");
        assert_eq!(content.visual(5).src, "x.gif");
    }

    #[test]
    fn test_movement_allowed() {
        let config = EvasionConfig::default();
        assert!(config.movement_allowed(1280.0, false));
        assert!(!config.movement_allowed(768.0, false));
        assert!(!config.movement_allowed(1280.0, true));

        let mut always = config.clone();
        always.mobile.disable_movement = false;
        assert!(always.movement_allowed(400.0, true));
    }
}
