//! Compiles a binding table into the lookup used at event time
//!
//! Compilation is pure and never fails: conflicting bindings are dropped from the
//! lookup and reported alongside it, so the caller can go on with the valid subset.

use crate::mapping::binding::{Binding, Direction, KeyConfig};
use crate::mapping::codes;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Controller target claimed by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Target {
    Button(usize),
    Axis(usize, Direction),
}

impl From<&Binding> for Target {
    fn from(binding: &Binding) -> Self {
        match *binding {
            Binding::Button { button } => Target::Button(button),
            Binding::Axis { axis, direction } => Target::Axis(axis, direction),
        }
    }
}

/// Immutable code → binding lookup
///
/// A new configuration always produces a new mapping; there is no way to edit one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeMapping {
    bindings: HashMap<String, Binding>,
}

impl CodeMapping {
    pub fn get(&self, code: &str) -> Option<&Binding> {
        self.bindings.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.bindings.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn has_mouse_buttons(&self) -> bool {
        codes::MOUSE_BUTTON_CODES
            .iter()
            .any(|code| self.contains(code))
    }

    pub fn has_scroll(&self) -> bool {
        codes::SCROLL_CODES.iter().any(|code| self.contains(code))
    }
}

/// A binding dropped because an earlier code already claimed its target
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidBinding {
    pub code: String,
    pub binding: Binding,
    /// Code of the earlier binding that kept the target
    pub claimed_by: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledConfig {
    pub code_mapping: CodeMapping,
    pub invalid_bindings: Vec<InvalidBinding>,
    pub has_errors: bool,
}

/// Walks the table in declaration order; the first binding to claim a target keeps it
pub fn compile(key_config: &KeyConfig) -> CompiledConfig {
    let mut bindings = HashMap::with_capacity(key_config.len());
    let mut claimed: HashMap<Target, &str> = HashMap::new();
    let mut invalid_bindings = Vec::new();

    for entry in key_config.iter() {
        let target = Target::from(&entry.binding);
        if let Some(owner) = claimed.get(&target) {
            warn!(
                "Dropping binding {} -> {}: target already bound to {}",
                entry.code, entry.binding, owner
            );
            invalid_bindings.push(InvalidBinding {
                code: entry.code.clone(),
                binding: entry.binding,
                claimed_by: owner.to_string(),
            });
            continue;
        }
        claimed.insert(target, entry.code.as_str());
        bindings.insert(entry.code.clone(), entry.binding);
    }

    debug!(
        "Compiled {} bindings ({} dropped)",
        bindings.len(),
        invalid_bindings.len()
    );

    let has_errors = !invalid_bindings.is_empty();
    CompiledConfig {
        code_mapping: CodeMapping { bindings },
        invalid_bindings,
        has_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::codes::StandardButton;

    #[test]
    fn first_binding_for_a_button_wins() {
        let mut config = KeyConfig::new();
        config
            .bind("KeyJ", Binding::button(StandardButton::A))
            .bind("Space", Binding::button(StandardButton::A))
            .bind("KeyK", Binding::button(StandardButton::B));

        let compiled = compile(&config);

        assert!(compiled.has_errors);
        assert_eq!(
            compiled.code_mapping.get("KeyJ"),
            Some(&Binding::button(StandardButton::A))
        );
        assert!(!compiled.code_mapping.contains("Space"));
        assert!(compiled.code_mapping.contains("KeyK"));
        assert_eq!(
            compiled.invalid_bindings,
            vec![InvalidBinding {
                code: "Space".to_string(),
                binding: Binding::button(StandardButton::A),
                claimed_by: "KeyJ".to_string(),
            }]
        );
    }

    #[test]
    fn opposite_axis_directions_do_not_conflict() {
        let mut config = KeyConfig::new();
        config
            .bind("KeyA", Binding::axis(0, Direction::Negative))
            .bind("KeyD", Binding::axis(0, Direction::Positive))
            .bind("ArrowLeft", Binding::axis(0, Direction::Negative));

        let compiled = compile(&config);

        assert_eq!(compiled.code_mapping.len(), 2);
        assert_eq!(compiled.invalid_bindings.len(), 1);
        assert_eq!(compiled.invalid_bindings[0].code, "ArrowLeft");
        assert_eq!(compiled.invalid_bindings[0].claimed_by, "KeyA");
    }

    #[test]
    fn clean_config_has_no_errors() {
        let compiled = compile(&crate::mapping::GamepadConfig::default_config().key_config);
        assert!(!compiled.has_errors);
        assert!(compiled.invalid_bindings.is_empty());
        assert!(compiled.code_mapping.has_mouse_buttons());
        assert!(compiled.code_mapping.has_scroll());
    }

    #[test]
    fn detects_mouse_and_scroll_codes() {
        let mut config = KeyConfig::new();
        config.bind("KeyA", Binding::button(StandardButton::A));
        let compiled = compile(&config);
        assert!(!compiled.code_mapping.has_mouse_buttons());
        assert!(!compiled.code_mapping.has_scroll());

        config.bind(codes::SCROLL_DOWN, Binding::button(StandardButton::B));
        assert!(compile(&config).code_mapping.has_scroll());
    }

    #[test]
    fn compile_is_deterministic() {
        let config = crate::mapping::GamepadConfig::default_config().key_config;
        assert_eq!(compile(&config), compile(&config));
    }
}
