// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! Provides configurable keyboard bindings for transport, section
//! navigation and UI actions.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::ControlAction;

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    /// Create a new shortcut
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    /// Create a shortcut with Shift modifier
    pub fn shift(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::SHIFT)
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// The shortcut
    pub shortcut: Shortcut,
    /// The action to perform
    pub action: ControlAction,
    /// Description for help display
    pub description: String,
    /// Category for grouping in help
    pub category: String,
}

impl KeyBinding {
    /// Create a new key binding
    pub fn new(
        shortcut: Shortcut,
        action: ControlAction,
        description: impl Into<String>,
    ) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
            category: "General".to_string(),
        }
    }

    /// Set the category
    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// Keyboard controller with configurable bindings
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a keyboard controller with default bindings
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.add_default_bindings();
        controller
    }

    fn add_default_bindings(&mut self) {
        // Transport
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char(' ')),
            ControlAction::TogglePlay,
            "Start/Stop",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('c')),
            ControlAction::CountIn,
            "Start with count-in",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Enter),
            ControlAction::Play,
            "Start",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Esc),
            ControlAction::Stop,
            "Stop",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('r')),
            ControlAction::Reset,
            "Reset to start",
        ).category("Transport"));

        // Sections (1-9)
        for i in 0..9u32 {
            if let Some(c) = char::from_digit(i + 1, 10) {
                self.add(KeyBinding::new(
                    Shortcut::key(KeyCode::Char(c)),
                    ControlAction::JumpTo(i as usize),
                    format!("Jump to section {}", i + 1),
                ).category("Sections"));
            }
        }

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Left),
            ControlAction::PreviousSection,
            "Previous section",
        ).category("Sections"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Right),
            ControlAction::NextSection,
            "Next section",
        ).category("Sections"));

        // UI
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('?')),
            ControlAction::ToggleHelp,
            "Toggle Help",
        ).category("UI"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('h')),
            ControlAction::ToggleHelp,
            "Toggle Help",
        ).category("UI"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('q')),
            ControlAction::Quit,
            "Quit",
        ).category("UI"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('c')),
            ControlAction::Quit,
            "Quit",
        ).category("UI"));
    }

    /// Add a key binding
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Get action for a key event
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<&ControlAction> {
        // Terminals report shifted symbols like '?' with SHIFT set
        let modifiers = match code {
            KeyCode::Char(c) if !c.is_ascii_alphanumeric() && c != ' ' => {
                modifiers - KeyModifiers::SHIFT
            }
            _ => modifiers,
        };
        let shortcut = Shortcut::new(code, modifiers);
        self.bindings.get(&shortcut).map(|b| &b.action)
    }

    /// Process a key event and return the action
    pub fn process_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<ControlAction> {
        self.get_action(code, modifiers).cloned()
    }

    /// Get bindings grouped by category
    pub fn bindings_by_category(&self) -> HashMap<String, Vec<&KeyBinding>> {
        let mut grouped: HashMap<String, Vec<&KeyBinding>> = HashMap::new();

        for binding in self.bindings.values() {
            grouped
                .entry(binding.category.clone())
                .or_default()
                .push(binding);
        }

        grouped
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl");
    }
    if shortcut.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt");
    }
    if shortcut.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift");
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        _ => "?".to_string(),
    };

    parts.push(&key);
    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_creation() {
        let s = Shortcut::key(KeyCode::Char('a'));
        assert_eq!(s.code, KeyCode::Char('a'));
        assert_eq!(s.modifiers, KeyModifiers::NONE);

        let s = Shortcut::ctrl(KeyCode::Char('c'));
        assert_eq!(s.modifiers, KeyModifiers::CONTROL);

        let s = Shortcut::shift(KeyCode::Left);
        assert_eq!(s.modifiers, KeyModifiers::SHIFT);
    }

    #[test]
    fn test_keyboard_controller_defaults() {
        let controller = KeyboardController::with_defaults();

        let action = controller.get_action(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::TogglePlay));

        let action = controller.get_action(KeyCode::Char('r'), KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::Reset));

        let action = controller.get_action(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::CountIn));

        let action = controller.get_action(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action, Some(&ControlAction::Quit));
    }

    #[test]
    fn test_keyboard_controller_sections() {
        let controller = KeyboardController::with_defaults();

        for i in 1..=9 {
            let c = char::from_digit(i, 10).unwrap();
            let action = controller.get_action(KeyCode::Char(c), KeyModifiers::NONE);
            assert_eq!(action, Some(&ControlAction::JumpTo((i - 1) as usize)));
        }
        assert_eq!(
            controller.get_action(KeyCode::Right, KeyModifiers::NONE),
            Some(&ControlAction::NextSection)
        );
    }

    #[test]
    fn test_shifted_symbol() {
        let controller = KeyboardController::with_defaults();
        let action = controller.get_action(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert_eq!(action, Some(&ControlAction::ToggleHelp));
    }

    #[test]
    fn test_add_binding_replaces() {
        let mut controller = KeyboardController::with_defaults();

        let binding = KeyBinding::new(
            Shortcut::key(KeyCode::Char('r')),
            ControlAction::Stop,
            "Custom Stop",
        );

        controller.add(binding);
        assert_eq!(
            controller.get_action(KeyCode::Char('r'), KeyModifiers::NONE),
            Some(&ControlAction::Stop)
        );
        assert!(KeyboardController::new()
            .get_action(KeyCode::Char('r'), KeyModifiers::NONE)
            .is_none());
    }

    #[test]
    fn test_format_shortcut() {
        let s = Shortcut::key(KeyCode::Char(' '));
        assert_eq!(format_shortcut(&s), "Space");

        let s = Shortcut::ctrl(KeyCode::Char('c'));
        assert_eq!(format_shortcut(&s), "Ctrl+C");

        let s = Shortcut::key(KeyCode::Right);
        assert_eq!(format_shortcut(&s), "→");
    }

    #[test]
    fn test_bindings_by_category() {
        let controller = KeyboardController::with_defaults();
        let grouped = controller.bindings_by_category();

        assert!(grouped.contains_key("Transport"));
        assert!(grouped.contains_key("Sections"));
        assert!(grouped.contains_key("UI"));
        assert_eq!(grouped["Sections"].len(), 11);
    }

    #[test]
    fn test_process_key() {
        let controller = KeyboardController::with_defaults();

        let action = controller.process_key(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(action, Some(ControlAction::TogglePlay));

        let action = controller.process_key(KeyCode::Char('z'), KeyModifiers::NONE);
        assert_eq!(action, None);
    }
}
