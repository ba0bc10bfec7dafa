//! Raw input events as delivered by the host, and what the engine reports back

use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// One raw event from the host document
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { code: String, repeat: bool },
    KeyUp { code: String },
    /// `button` is the DOM `MouseEvent.button` number
    MouseDown { button: i16 },
    MouseUp { button: i16 },
    Wheel { delta_y: f64 },
    ContextMenu,
    /// Relative pointer motion, only reported while pointer lock is held
    MouseMove { dx: f64, dy: f64 },
    PointerLockChange { locked: bool },
    PointerLockError,
}

impl InputEvent {
    /// Listener that has to be attached for this event to reach the engine
    pub fn listener(&self) -> ListenerKind {
        match self {
            InputEvent::KeyDown { .. } => ListenerKind::KeyDown,
            InputEvent::KeyUp { .. } => ListenerKind::KeyUp,
            InputEvent::MouseDown { .. } => ListenerKind::MouseDown,
            InputEvent::MouseUp { .. } => ListenerKind::MouseUp,
            InputEvent::Wheel { .. } => ListenerKind::Wheel,
            InputEvent::ContextMenu => ListenerKind::ContextMenu,
            InputEvent::MouseMove { .. } => ListenerKind::MouseMove,
            InputEvent::PointerLockChange { .. } => ListenerKind::PointerLockChange,
            InputEvent::PointerLockError => ListenerKind::PointerLockError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    KeyDown,
    KeyUp,
    MouseDown,
    MouseUp,
    Wheel,
    ContextMenu,
    MouseMove,
    PointerLockChange,
    PointerLockError,
}

/// Whether the host should suppress the event's default action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    PassThrough,
    Consumed,
}

/// Mouse listening status shown by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListeningStatus {
    Listening,
    #[default]
    NotListening,
    Error,
}

impl Display for ListeningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListeningStatus::Listening => write!(f, "listening"),
            ListeningStatus::NotListening => write!(f, "not-listening"),
            ListeningStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseEventError {
    #[error("Empty event line")]
    Empty,

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

fn number<T: FromStr>(arg: Option<&str>, event: &'static str) -> Result<T, ParseEventError> {
    let raw = arg.ok_or(ParseEventError::MissingArgument(event))?;
    raw.parse()
        .map_err(|_| ParseEventError::InvalidNumber(raw.to_string()))
}

fn code(arg: Option<&str>, event: &'static str) -> Result<String, ParseEventError> {
    arg.map(str::to_string)
        .ok_or(ParseEventError::MissingArgument(event))
}

/// Line format used by the host binary, e.g. `keydown KeyW`, `wheel -120`, `move 4 -2`
impl FromStr for InputEvent {
    type Err = ParseEventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(ParseEventError::Empty)?;

        let event = match name {
            "keydown" => InputEvent::KeyDown {
                code: code(parts.next(), "keydown")?,
                repeat: false,
            },
            "keyrepeat" => InputEvent::KeyDown {
                code: code(parts.next(), "keyrepeat")?,
                repeat: true,
            },
            "keyup" => InputEvent::KeyUp {
                code: code(parts.next(), "keyup")?,
            },
            "mousedown" => InputEvent::MouseDown {
                button: number(parts.next(), "mousedown")?,
            },
            "mouseup" => InputEvent::MouseUp {
                button: number(parts.next(), "mouseup")?,
            },
            "wheel" => InputEvent::Wheel {
                delta_y: number(parts.next(), "wheel")?,
            },
            "move" => InputEvent::MouseMove {
                dx: number(parts.next(), "move")?,
                dy: number(parts.next(), "move")?,
            },
            "contextmenu" => InputEvent::ContextMenu,
            "lock" => InputEvent::PointerLockChange { locked: true },
            "unlock" => InputEvent::PointerLockChange { locked: false },
            "lockerror" => InputEvent::PointerLockError,
            other => return Err(ParseEventError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}
