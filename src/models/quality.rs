//! Recall quality on the SM-2 scale.
//!
//! - 0: Complete blackout
//! - 1: Incorrect, but the answer was recognized
//! - 2: Incorrect, but the answer seemed easy once shown
//! - 3: Correct with serious difficulty
//! - 4: Correct after hesitation
//! - 5: Perfect response

use crate::error::InvalidQuality;
use std::fmt;

/// A validated quality rating in 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, InvalidQuality> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidQuality(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Quality {
    type Error = InvalidQuality;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three answer buttons of the study screen.
///
/// The study screen only offers a narrowed scale; the scheduler still accepts 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerButton {
    /// "Сложно"
    Hard,
    /// "Нормально"
    Normal,
    /// "Легко"
    Easy,
}

impl AnswerButton {
    pub fn quality(self) -> Quality {
        match self {
            AnswerButton::Hard => Quality(1),
            AnswerButton::Normal => Quality(3),
            AnswerButton::Easy => Quality(5),
        }
    }

    /// Parses a keyboard shortcut or button name (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "h" | "hard" | "сложно" => Some(AnswerButton::Hard),
            "n" | "normal" | "нормально" => Some(AnswerButton::Normal),
            "e" | "easy" | "легко" => Some(AnswerButton::Easy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnswerButton::Hard => "Сложно",
            AnswerButton::Normal => "Нормально",
            AnswerButton::Easy => "Легко",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for value in 0..=5 {
            let quality = Quality::new(value).unwrap();
            assert_eq!(quality.value() as i64, value);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(Quality::new(6), Err(InvalidQuality(6)));
        assert_eq!(Quality::new(-1), Err(InvalidQuality(-1)));
        assert_eq!(Quality::try_from(7), Err(InvalidQuality(7)));
    }

    #[test]
    fn test_button_mapping() {
        assert_eq!(AnswerButton::Hard.quality().value(), 1);
        assert_eq!(AnswerButton::Normal.quality().value(), 3);
        assert_eq!(AnswerButton::Easy.quality().value(), 5);
    }

    #[test]
    fn test_button_from_key() {
        assert_eq!(AnswerButton::from_key("h"), Some(AnswerButton::Hard));
        assert_eq!(AnswerButton::from_key(" Normal\n"), Some(AnswerButton::Normal));
        assert_eq!(AnswerButton::from_key("Легко"), Some(AnswerButton::Easy));
        assert_eq!(AnswerButton::from_key("3"), None);
    }
}
