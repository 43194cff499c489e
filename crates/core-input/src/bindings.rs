//! Configured key names resolved into switch activations.

use core_config::KeysConfig;
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_generation::Activation;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyBindingError {
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
    #[error("key `{key}` is bound to both {first} and {second}")]
    Conflict {
        key: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("no key bound to {0}")]
    Unbound(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundAction {
    Activate(Activation),
    Quit,
}

impl BoundAction {
    fn label(&self) -> &'static str {
        match self {
            BoundAction::Activate(Activation::MoveRight) => "right",
            BoundAction::Activate(Activation::MoveDown) => "down",
            BoundAction::Activate(Activation::Select) => "select",
            BoundAction::Quit => "quit",
        }
    }
}

/// Parse a configured key name. Named keys are case-insensitive; anything else must be a single
/// character.
pub fn parse_key_name(name: &str) -> Result<KeyCode, KeyBindingError> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }
    let code = match trimmed.to_ascii_lowercase().as_str() {
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        _ => return Err(KeyBindingError::UnknownKey(name.to_string())),
    };
    Ok(code)
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, BoundAction>,
}

impl KeyBindings {
    pub fn from_config(cfg: &KeysConfig) -> Result<Self, KeyBindingError> {
        let mut map = HashMap::new();
        let groups = [
            (&cfg.right, BoundAction::Activate(Activation::MoveRight)),
            (&cfg.down, BoundAction::Activate(Activation::MoveDown)),
            (&cfg.select, BoundAction::Activate(Activation::Select)),
            (&cfg.quit, BoundAction::Quit),
        ];
        for (names, action) in groups {
            if names.is_empty() {
                return Err(KeyBindingError::Unbound(action.label()));
            }
            for name in names {
                let code = parse_key_name(name)?;
                match map.insert(code, action) {
                    Some(prev) if prev != action => {
                        return Err(KeyBindingError::Conflict {
                            key: name.clone(),
                            first: prev.label(),
                            second: action.label(),
                        });
                    }
                    _ => {}
                }
            }
        }
        tracing::debug!(target: "input.keys", bound = map.len(), "key_bindings_loaded");
        Ok(Self { map })
    }

    /// Resolve a key press. Ctrl/Alt chords never match a binding; Shift is ignored so an
    /// uppercase letter still reaches its binding through its own character.
    pub fn resolve(&self, key: &KeyEvent) -> Option<BoundAction> {
        if key.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
            return None;
        }
        self.map.get(&key.code).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
