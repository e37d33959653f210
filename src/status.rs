use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

/// I/O mode a predicate is evaluated under.
///
/// `Read` resolves against existing directory contents; `Write` and `Append`
/// judge the shape of the specification itself so that paths can be computed
/// for entries that do not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Read,
    Write,
    Append,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Read => write!(f, "r"),
            Mode::Write => write!(f, "w"),
            Mode::Append => write!(f, "a"),
        }
    }
}

impl FromStr for Mode {
    type Err = ShelfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "r" | "read" => Ok(Mode::Read),
            "w" | "write" => Ok(Mode::Write),
            "a" | "append" => Ok(Mode::Append),
            other => Err(ShelfError::InvalidSpecification(format!(
                "unknown I/O mode: '{other}'"
            ))),
        }
    }
}

/// The deepest hierarchy tier a predicate actually constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Root,
    Subject,
    Session,
    Domain,
    File,
}

impl Level {
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Root => None,
            Level::Subject => Some(Level::Root),
            Level::Session => Some(Level::Subject),
            Level::Domain => Some(Level::Session),
            Level::File => Some(Level::Domain),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Root => write!(f, "root"),
            Level::Subject => write!(f, "subject"),
            Level::Session => write!(f, "session"),
            Level::Domain => write!(f, "domain"),
            Level::File => write!(f, "file"),
        }
    }
}

/// How many concrete filesystem entities a specification denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStatus {
    Unspecified,
    None,
    Single,
    Multiple,
    Dynamic,
}

impl SelectionStatus {
    /// Combines per-field statuses into the status of the whole
    /// specification. The most attention-requiring status wins:
    /// `Unspecified > None > Dynamic > Multiple > Single`.
    pub fn combine(stats: impl IntoIterator<Item = SelectionStatus>) -> SelectionStatus {
        let stats = stats.into_iter().collect::<Vec<_>>();
        for status in [
            SelectionStatus::Unspecified,
            SelectionStatus::None,
            SelectionStatus::Dynamic,
            SelectionStatus::Multiple,
        ] {
            if stats.contains(&status) {
                return status;
            }
        }
        if stats.is_empty() {
            SelectionStatus::Unspecified
        } else {
            SelectionStatus::Single
        }
    }

    /// Classifies a read-time enumeration by its size.
    pub fn of_count(count: usize) -> SelectionStatus {
        match count {
            0 => SelectionStatus::None,
            1 => SelectionStatus::Single,
            _ => SelectionStatus::Multiple,
        }
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionStatus::Unspecified => write!(f, "unspecified"),
            SelectionStatus::None => write!(f, "none"),
            SelectionStatus::Single => write!(f, "single"),
            SelectionStatus::Multiple => write!(f, "multiple"),
            SelectionStatus::Dynamic => write!(f, "dynamic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Root < Level::Subject);
        assert!(Level::Subject < Level::Session);
        assert!(Level::Session < Level::Domain);
        assert!(Level::Domain < Level::File);
        assert_eq!(Level::File.parent(), Some(Level::Domain));
        assert_eq!(Level::Root.parent(), None);
    }

    #[test]
    fn combine_precedence() {
        use SelectionStatus::*;
        assert_eq!(SelectionStatus::combine([Single, Single, Single]), Single);
        assert_eq!(SelectionStatus::combine([Single, Multiple]), Multiple);
        assert_eq!(SelectionStatus::combine([Multiple, Dynamic]), Dynamic);
        assert_eq!(SelectionStatus::combine([Dynamic, None]), None);
        assert_eq!(SelectionStatus::combine([None, Unspecified]), Unspecified);
        assert_eq!(SelectionStatus::combine([]), Unspecified);
    }

    #[test]
    fn count_classification() {
        assert_eq!(SelectionStatus::of_count(0), SelectionStatus::None);
        assert_eq!(SelectionStatus::of_count(1), SelectionStatus::Single);
        assert_eq!(SelectionStatus::of_count(7), SelectionStatus::Multiple);
    }

    #[test]
    fn mode_round_trip() {
        assert_eq!("r".parse::<Mode>().unwrap(), Mode::Read);
        assert_eq!("write".parse::<Mode>().unwrap(), Mode::Write);
        assert_eq!(Mode::Append.to_string(), "a");
        assert!("x".parse::<Mode>().is_err());
    }
}
