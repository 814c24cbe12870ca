//! Small enums shared by steps, recipes and reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

// ============================================================================
// WriteMode
// ============================================================================

/// How the materializer treats a target file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Fail if the file exists.
    Create,
    /// Leave an existing file untouched.
    CreateIfAbsent,
    /// Replace the file unconditionally.
    #[default]
    Overwrite,
}

impl WriteMode {
    pub const ALL: &'static [Self] = &[Self::Create, Self::CreateIfAbsent, Self::Overwrite];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::CreateIfAbsent => "create-if-absent",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or(DomainError::UnknownVariant {
                field: "write mode",
                value: s,
            })
    }
}

// ============================================================================
// Position
// ============================================================================

/// Where injected content goes relative to the anchor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    After,
    Before,
}

impl Position {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::After => "after",
            Self::Before => "before",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "after" => Ok(Self::After),
            "before" => Ok(Self::Before),
            other => Err(DomainError::UnknownVariant {
                field: "position",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// LineEnding
// ============================================================================

/// Line terminator convention of an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// CRLF if the text contains any CRLF, LF otherwise.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mode_parses_both_spellings() {
        assert_eq!(
            "create-if-absent".parse::<WriteMode>().unwrap(),
            WriteMode::CreateIfAbsent
        );
        assert_eq!(
            "create_if_absent".parse::<WriteMode>().unwrap(),
            WriteMode::CreateIfAbsent
        );
        assert_eq!("Overwrite".parse::<WriteMode>().unwrap(), WriteMode::Overwrite);
        assert!("replace".parse::<WriteMode>().is_err());
    }

    #[test]
    fn write_mode_display_round_trips_through_from_str() {
        for mode in WriteMode::ALL {
            assert_eq!(mode.to_string().parse::<WriteMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn position_parses() {
        assert_eq!("before".parse::<Position>().unwrap(), Position::Before);
        assert!("middle".parse::<Position>().is_err());
    }

    #[test]
    fn line_ending_detection() {
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }
}
