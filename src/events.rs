//! Input surface: key identifiers and the discrete event stream the
//! engine consumes.
//!
//! The input device driver is external; it delivers `KeyDown`/`KeyUp`
//! events whose codes are either note keys (one character, compared
//! case-insensitively) or octave modifiers.

use std::fmt;

/// A case-normalized key identifier: one character of the physical
/// layout, uppercased on construction so `'z'` and `'Z'` are the same
/// key everywhere (tuning table, active-note map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(char);

impl Key {
    pub fn new(ch: char) -> Self {
        Key(ch.to_ascii_uppercase())
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl From<char> for Key {
    fn from(ch: char) -> Self {
        Key::new(ch)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Held octave modifiers. On the reference keyboard these are left
/// shift (raise), left control (lower) and left alt (widen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Shift the pitch exponent up one octave.
    Raise,
    /// Shift the pitch exponent down one octave.
    Lower,
    /// Double the accumulated exponent, widening the raise/lower spread.
    Widen,
}

/// A key code as delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Note(Key),
    Modifier(Modifier),
}

/// One discrete input event. Delivery order defines processing order;
/// each event is handled to completion before the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    Quit,
}

impl InputEvent {
    /// Convenience constructor for a note-key press.
    pub fn note_down(ch: char) -> Self {
        InputEvent::KeyDown(KeyCode::Note(Key::new(ch)))
    }

    /// Convenience constructor for a note-key release.
    pub fn note_up(ch: char) -> Self {
        InputEvent::KeyUp(KeyCode::Note(Key::new(ch)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive() {
        assert_eq!(Key::new('z'), Key::new('Z'));
        assert_eq!(Key::new(','), Key::new(','));
        assert_eq!(Key::new('q').as_char(), 'Q');
    }

    #[test]
    fn note_event_constructors_normalize() {
        assert_eq!(
            InputEvent::note_down('a'),
            InputEvent::KeyDown(KeyCode::Note(Key::new('A')))
        );
        assert_eq!(
            InputEvent::note_up('A'),
            InputEvent::KeyUp(KeyCode::Note(Key::new('a')))
        );
    }
}
