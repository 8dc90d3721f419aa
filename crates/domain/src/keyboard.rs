//! Keyboard chords used by command shortcuts.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A modifier key. Ordering follows display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyModifier {
    /// Control.
    Ctrl,
    /// Alt / Option.
    Alt,
    /// Shift.
    Shift,
    /// Meta / Command / Super.
    Meta,
}

impl KeyModifier {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Meta => "Meta",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Self::Ctrl),
            "alt" | "option" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            "meta" | "cmd" | "command" | "super" => Some(Self::Meta),
            _ => None,
        }
    }
}

/// A key plus the set of modifiers held with it.
///
/// Keys are stored lowercase so `Ctrl+S` and `ctrl+s` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    key: String,
    modifiers: BTreeSet<KeyModifier>,
}

impl KeyChord {
    /// Creates a chord.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidShortcut` if the key is blank.
    pub fn new(
        key: impl Into<String>,
        modifiers: impl IntoIterator<Item = KeyModifier>,
    ) -> DomainResult<Self> {
        let key = key.into().trim().to_lowercase();
        if key.is_empty() {
            return Err(DomainError::InvalidShortcut("key must not be empty".to_string()));
        }
        Ok(Self {
            key,
            modifiers: modifiers.into_iter().collect(),
        })
    }

    /// The (lowercase) key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The held modifiers, in display order.
    pub fn modifiers(&self) -> impl Iterator<Item = KeyModifier> + '_ {
        self.modifiers.iter().copied()
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.label())?;
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_uppercase())
        } else {
            let mut chars = self.key.chars();
            if let Some(first) = chars.next() {
                write!(f, "{}{}", first.to_uppercase(), chars.as_str())?;
            }
            Ok(())
        }
    }
}

impl FromStr for KeyChord {
    type Err = DomainError;

    /// Parses `"Ctrl+Shift+P"`-style descriptors. The last token is the key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = tokens.split_last() else {
            return Err(DomainError::InvalidShortcut(s.to_string()));
        };

        let modifiers = modifiers
            .iter()
            .map(|token| {
                KeyModifier::parse(token).ok_or_else(|| {
                    DomainError::InvalidShortcut(format!("unknown modifier '{token}' in '{s}'"))
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Self::new(*key, modifiers)
    }
}
