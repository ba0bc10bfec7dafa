//! Binding table and gamepad configuration as edited by the user
//!
//! A [`GamepadConfig`] is plain data: it is validated structurally when it is built or
//! parsed, and compiled into a lookup table by [`crate::mapping::compiler`] on every
//! `enable()`.

use crate::mapping::codes::{self, StandardButton};
use crate::mapping::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub const DEFAULT_SENSITIVITY: f64 = 20.0;

/// Signed direction of an axis binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    pub fn value(self) -> f64 {
        match self {
            Direction::Negative => -1.0,
            Direction::Positive => 1.0,
        }
    }
}

/// Target of a single source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    /// Controller button index in the standard layout
    Button { button: usize },
    /// Axis index with the direction the axis is pushed to while the code is held
    Axis { axis: usize, direction: Direction },
}

impl Binding {
    pub fn button(button: StandardButton) -> Self {
        Binding::Button {
            button: button.index(),
        }
    }

    pub fn axis(axis: usize, direction: Direction) -> Self {
        Binding::Axis { axis, direction }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Button { button } => match StandardButton::from_index(*button) {
                Some(named) => write!(f, "button {} ({})", button, named),
                None => write!(f, "button {}", button),
            },
            Binding::Axis { axis, direction } => write!(f, "axis {} {:?}", axis, direction),
        }
    }
}

/// One row of the binding table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub code: String,
    #[serde(flatten)]
    pub binding: Binding,
}

/// Ordered binding table, at most one binding per source code
///
/// Declaration order is kept: the compiler walks it front to back and the first
/// binding to claim a target wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeyBinding>", into = "Vec<KeyBinding>")]
pub struct KeyConfig {
    entries: Vec<KeyBinding>,
}

impl KeyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `code`, replacing an existing binding for the same code in place
    pub fn bind(&mut self, code: impl Into<String>, binding: Binding) -> &mut Self {
        let code = code.into();
        match self.entries.iter_mut().find(|entry| entry.code == code) {
            Some(entry) => entry.binding = binding,
            None => self.entries.push(KeyBinding { code, binding }),
        }
        self
    }

    pub fn get(&self, code: &str) -> Option<&Binding> {
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| &entry.binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<KeyBinding>> for KeyConfig {
    type Error = ConfigError;

    fn try_from(entries: Vec<KeyBinding>) -> Result<Self, Self::Error> {
        for (position, entry) in entries.iter().enumerate() {
            if entries[..position].iter().any(|seen| seen.code == entry.code) {
                return Err(ConfigError::DuplicateCode(entry.code.clone()));
            }
        }
        Ok(Self { entries })
    }
}

impl From<KeyConfig> for Vec<KeyBinding> {
    fn from(config: KeyConfig) -> Self {
        config.entries
    }
}

/// Analog stick driven by mouse motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    /// Index of the stick's x axis; y is the next one
    pub fn x_axis(self) -> usize {
        match self {
            Stick::Left => 0,
            Stick::Right => 2,
        }
    }
}

impl TryFrom<u8> for Stick {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Stick::Left),
            1 => Ok(Stick::Right),
            other => Err(ConfigError::InvalidStick(other)),
        }
    }
}

impl From<Stick> for u8 {
    fn from(stick: Stick) -> Self {
        match stick {
            Stick::Left => 0,
            Stick::Right => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseConfig {
    /// Stick driven by pointer motion; `None` disables motion tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_controls: Option<Stick>,

    /// Pointer delta (per flush) that maps to a fully deflected stick
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
}

fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            mouse_controls: None,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl MouseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sensitivity > 0.0) || !self.sensitivity.is_finite() {
            return Err(ConfigError::InvalidSensitivity(self.sensitivity));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadConfig {
    #[serde(rename = "bindings", default)]
    pub key_config: KeyConfig,

    #[serde(rename = "mouse", default)]
    pub mouse_config: MouseConfig,
}

impl GamepadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mouse_config.validate()
    }

    /// Keyboard and mouse layout used when no preset is available
    pub fn default_config() -> Self {
        let mut key_config = KeyConfig::new();
        key_config
            .bind("Space", Binding::button(StandardButton::A))
            .bind("KeyC", Binding::button(StandardButton::B))
            .bind("KeyR", Binding::button(StandardButton::X))
            .bind("KeyE", Binding::button(StandardButton::Y))
            .bind(codes::SCROLL_UP, Binding::button(StandardButton::LeftShoulder))
            .bind(codes::SCROLL_DOWN, Binding::button(StandardButton::RightShoulder))
            .bind(codes::RIGHT_CLICK, Binding::button(StandardButton::LeftTrigger))
            .bind("LeftClick", Binding::button(StandardButton::RightTrigger))
            .bind("Tab", Binding::button(StandardButton::Select))
            .bind("Enter", Binding::button(StandardButton::Start))
            .bind("ShiftLeft", Binding::button(StandardButton::LeftStickPress))
            .bind("KeyF", Binding::button(StandardButton::RightStickPress))
            .bind("ArrowUp", Binding::button(StandardButton::DPadUp))
            .bind("ArrowDown", Binding::button(StandardButton::DPadDown))
            .bind("ArrowLeft", Binding::button(StandardButton::DPadLeft))
            .bind("ArrowRight", Binding::button(StandardButton::DPadRight))
            .bind("KeyA", Binding::axis(0, Direction::Negative))
            .bind("KeyD", Binding::axis(0, Direction::Positive))
            .bind("KeyW", Binding::axis(1, Direction::Negative))
            .bind("KeyS", Binding::axis(1, Direction::Positive));

        GamepadConfig {
            key_config,
            mouse_config: MouseConfig {
                mouse_controls: Some(Stick::Right),
                sensitivity: DEFAULT_SENSITIVITY,
            },
        }
    }
}
