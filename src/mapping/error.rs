//! Fehlerdefinitionen für das Mapping-Modul

use thiserror::Error;

/// Strukturelle Fehler beim Laden oder Prüfen einer Gamepad-Konfiguration
///
/// Doppelte Ziele (zwei Codes auf denselben Button) meldet der Compiler als Diagnose.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Ein Quell-Code wurde mehrfach belegt
    #[error("Duplicate binding for code: {0}")]
    DuplicateCode(String),

    /// Stick-Index außerhalb von {0, 1}
    #[error("Invalid stick index: {0} (expected 0 or 1)")]
    InvalidStick(u8),

    /// Mausempfindlichkeit muss positiv sein
    #[error("Invalid mouse sensitivity: {0} (must be > 0)")]
    InvalidSensitivity(f64),

    /// Preset-Datei konnte nicht gelesen werden
    #[error("Failed to read preset: {0}")]
    Io(#[from] std::io::Error),

    /// Preset-Datei ist kein gültiges TOML
    #[error("Failed to parse preset: {0}")]
    Parse(#[from] toml::de::Error),
}
