use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState, Modifiers};

/// A change in a key's held state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyTransition {
    pub key: Key,
    pub pressed: bool,
}

/// Keyboard state for the window.
///
/// Filters OS key-repeat so each physical press yields one transition, and
/// releases every held key when focus is lost so nothing stays stuck down.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies an event and returns the resulting key transitions.
    pub fn apply_event(&mut self, ev: &InputEvent) -> Vec<KeyTransition> {
        match ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
                Vec::new()
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if *f {
                    return Vec::new();
                }
                self.keys_down
                    .drain()
                    .map(|key| KeyTransition { key, pressed: false })
                    .collect()
            }

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = *modifiers;
                let changed = match state {
                    KeyState::Pressed => self.keys_down.insert(*key),
                    KeyState::Released => self.keys_down.remove(key),
                };
                if changed {
                    vec![KeyTransition {
                        key: *key,
                        pressed: state.is_pressed(),
                    }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers::default(),
            repeat,
        }
    }

    #[test]
    fn repeat_press_yields_single_transition() {
        let mut s = InputState::default();
        assert_eq!(s.apply_event(&key(Key::W, KeyState::Pressed, false)).len(), 1);
        assert!(s.apply_event(&key(Key::W, KeyState::Pressed, true)).is_empty());
        assert!(s.key_down(Key::W));

        let t = s.apply_event(&key(Key::W, KeyState::Released, false));
        assert_eq!(t, vec![KeyTransition { key: Key::W, pressed: false }]);
        assert!(!s.key_down(Key::W));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut s = InputState::default();
        assert!(s.apply_event(&key(Key::A, KeyState::Released, false)).is_empty());
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let mut s = InputState::default();
        s.apply_event(&key(Key::W, KeyState::Pressed, false));
        s.apply_event(&key(Key::Shift, KeyState::Pressed, false));

        let t = s.apply_event(&InputEvent::Focused(false));
        assert_eq!(t.len(), 2);
        assert!(t.iter().any(|t| t.key == Key::W));
        assert!(t.iter().any(|t| t.key == Key::Shift));
        assert!(t.iter().all(|t| !t.pressed));
        assert!(s.keys_down.is_empty());
    }
}
