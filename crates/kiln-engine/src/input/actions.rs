use std::collections::HashMap;

use super::state::KeyTransition;
use super::types::Key;

/// Abstract input actions consumed by the camera and the frame pipeline.
///
/// Movement and view actions are held (pressed/released); display and toggle
/// actions fire on press.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    MoveUp,
    MoveDown,

    TiltUp,
    TiltDown,
    TurnLeft,
    TurnRight,
    Boost,

    ToggleFullscreen,
    ToggleBorderless,
    CycleMonitor,
    GrowResolution,
    ShrinkResolution,
    ApplyResolution,

    TogglePostFx,
    ToggleWireframe,
    ToggleVsync,

    Quit,
}

/// Key-to-action bindings.
#[derive(Debug, Clone)]
pub struct ActionMap {
    bindings: HashMap<Key, InputAction>,
}

impl ActionMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `key` to `action`, replacing any previous binding of that key.
    pub fn bind(&mut self, key: Key, action: InputAction) -> &mut Self {
        self.bindings.insert(key, action);
        self
    }

    pub fn action_for(&self, key: Key) -> Option<InputAction> {
        self.bindings.get(&key).copied()
    }

    /// Maps key transitions to `(action, pressed)` pairs, dropping unbound keys.
    pub fn translate(&self, transitions: &[KeyTransition]) -> Vec<(InputAction, bool)> {
        transitions
            .iter()
            .filter_map(|t| self.action_for(t.key).map(|a| (a, t.pressed)))
            .collect()
    }
}

impl Default for ActionMap {
    fn default() -> Self {
        use InputAction::*;

        let mut map = Self::empty();
        map.bind(Key::W, MoveForward)
            .bind(Key::S, MoveBackward)
            .bind(Key::A, StrafeLeft)
            .bind(Key::D, StrafeRight)
            .bind(Key::Space, MoveUp)
            .bind(Key::Control, MoveDown)
            .bind(Key::ArrowUp, TiltUp)
            .bind(Key::ArrowDown, TiltDown)
            .bind(Key::ArrowLeft, TurnLeft)
            .bind(Key::ArrowRight, TurnRight)
            .bind(Key::Shift, Boost)
            .bind(Key::F, ToggleFullscreen)
            .bind(Key::B, ToggleBorderless)
            .bind(Key::M, CycleMonitor)
            .bind(Key::Equal, GrowResolution)
            .bind(Key::NumpadAdd, GrowResolution)
            .bind(Key::Minus, ShrinkResolution)
            .bind(Key::NumpadSubtract, ShrinkResolution)
            .bind(Key::Enter, ApplyResolution)
            .bind(Key::P, TogglePostFx)
            .bind(Key::Z, ToggleWireframe)
            .bind(Key::V, ToggleVsync)
            .bind(Key::Escape, Quit);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_movement_and_display() {
        let map = ActionMap::default();
        assert_eq!(map.action_for(Key::W), Some(InputAction::MoveForward));
        assert_eq!(map.action_for(Key::Control), Some(InputAction::MoveDown));
        assert_eq!(map.action_for(Key::F), Some(InputAction::ToggleFullscreen));
        assert_eq!(map.action_for(Key::NumpadAdd), Some(InputAction::GrowResolution));
        assert_eq!(map.action_for(Key::Q), None);
    }

    #[test]
    fn rebinding_replaces_previous_action() {
        let mut map = ActionMap::default();
        map.bind(Key::W, InputAction::TiltUp);
        assert_eq!(map.action_for(Key::W), Some(InputAction::TiltUp));
    }

    #[test]
    fn translate_drops_unbound_keys() {
        let map = ActionMap::default();
        let out = map.translate(&[
            KeyTransition { key: Key::Q, pressed: true },
            KeyTransition { key: Key::Shift, pressed: true },
            KeyTransition { key: Key::Shift, pressed: false },
        ]);
        assert_eq!(
            out,
            vec![(InputAction::Boost, true), (InputAction::Boost, false)]
        );
    }
}
