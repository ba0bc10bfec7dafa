//! Modul für die Zuordnung von Tastatur- und Maus-Eingaben zu Gamepad-Zielen.
//!
//! Enthält das Konfigurationsmodell ([`GamepadConfig`]), die Eingabe-Codes und den
//! Compiler, der aus einer Binding-Tabelle eine schnelle Lookup-Tabelle erzeugt.
//!
//! ```text
//! KeyConfig ──► compile() ──► CodeMapping + InvalidBinding[]
//! ```

pub mod binding;
pub mod codes;
pub mod compiler;
pub mod error;

// Re-exports für einfacheren Zugriff
pub use binding::{
    Binding, Direction, GamepadConfig, KeyBinding, KeyConfig, MouseConfig, Stick,
    DEFAULT_SENSITIVITY,
};
pub use codes::{ScrollDirection, StandardButton};
pub use compiler::{compile, CodeMapping, CompiledConfig, InvalidBinding};
pub use error::ConfigError;
