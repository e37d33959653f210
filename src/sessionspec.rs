use std::fmt;

use chrono::NaiveDate;

use crate::config::Naming;
use crate::error::ShelfError;
use crate::field::FieldSpec;
use crate::parsing::{self, SessionName};
use crate::status::SelectionStatus;

/// A structured, possibly-partial session identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSpec {
    kind: FieldSpec<String>,
    date: FieldSpec<NaiveDate>,
    index: FieldSpec<u32>,
}

impl SessionSpec {
    pub fn unspecified() -> Self {
        Self::default()
    }

    /// Builds a spec with validated constraints. Every kind token inside an
    /// `Exact`/`AnyOf` constraint must conform to the kind grammar.
    pub fn new(
        kind: FieldSpec<String>,
        date: FieldSpec<NaiveDate>,
        index: FieldSpec<u32>,
    ) -> Result<Self, ShelfError> {
        Ok(Self {
            kind: validate_kind(kind)?,
            date,
            index,
        })
    }

    /// Builds an exact spec from a properly formatted session name.
    pub fn from_name(name: &str) -> Result<Self, ShelfError> {
        let parsed = parsing::session_name(name)?;
        Ok(Self::from(&parsed))
    }

    /// Parses a composite string: first tried against the full name grammar,
    /// then treated as a bare kind token.
    pub fn parse(value: &str) -> Result<Self, ShelfError> {
        if let Ok(spec) = Self::from_name(value) {
            return Ok(spec);
        }
        Ok(Self {
            kind: FieldSpec::Exact(parsing::session_kind(value)?),
            ..Self::default()
        })
    }

    pub fn kind(&self) -> &FieldSpec<String> {
        &self.kind
    }

    pub fn date(&self) -> &FieldSpec<NaiveDate> {
        &self.date
    }

    pub fn index(&self) -> &FieldSpec<u32> {
        &self.index
    }

    pub fn with_kind(&self, kind: FieldSpec<String>) -> Result<Self, ShelfError> {
        Ok(Self {
            kind: validate_kind(kind)?,
            ..self.clone()
        })
    }

    pub fn with_date(&self, date: FieldSpec<NaiveDate>) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }

    pub fn with_index(&self, index: FieldSpec<u32>) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.kind.is_unconstrained() && self.date.is_unconstrained() && self.index.is_unconstrained()
    }

    pub fn any_dynamic(&self) -> bool {
        self.kind.is_dynamic() || self.date.is_dynamic() || self.index.is_dynamic()
    }

    pub fn write_status(&self) -> SelectionStatus {
        SelectionStatus::combine([
            self.kind.write_status(),
            self.date.write_status(),
            self.index.write_status(),
        ])
    }

    /// Tests a concrete session name against every field.
    pub fn matches(&self, candidate: &SessionName) -> bool {
        self.kind.matches(&candidate.kind)
            && self.date.matches(&candidate.date)
            && self.index.matches(&candidate.index)
    }

    /// The single session name this spec denotes, if it denotes exactly one.
    pub fn single_name(&self) -> Option<SessionName> {
        Some(SessionName {
            kind: self.kind.single()?.clone(),
            date: *self.date.single()?,
            index: *self.index.single()?,
        })
    }

    /// Canonical directory name; fails unless the spec denotes a single
    /// session.
    pub fn format(&self, naming: &Naming) -> Result<String, ShelfError> {
        match self.single_name() {
            Some(name) => parsing::format_session_name(&name, naming.session_index_width),
            None => match self.write_status() {
                status @ (SelectionStatus::Unspecified | SelectionStatus::None) => {
                    Err(ShelfError::UnspecifiedSelection { status })
                }
                status => Err(ShelfError::AmbiguousSelection { status }),
            },
        }
    }

    /// Display-only rendering that substitutes placeholders for fields that
    /// do not denote a single value. Never used for matching.
    pub fn display_name(&self, naming: &Naming) -> String {
        let kind = match self.kind.single() {
            Some(kind) => kind.clone(),
            None => placeholder(&self.kind, &naming.any_placeholder),
        };
        let date = match self.date.single() {
            Some(date) => date.format(parsing::DATE_FORMAT).to_string(),
            None => placeholder(&self.date, &naming.any_date_placeholder),
        };
        let index = match self.index.single() {
            Some(index) => parsing::format_session_index(*index, naming.session_index_width)
                .unwrap_or_else(|_| index.to_string()),
            None => placeholder(&self.index, &naming.any_placeholder),
        };
        format!("{kind}{date}-{index}")
    }
}

impl From<&SessionName> for SessionSpec {
    fn from(name: &SessionName) -> Self {
        Self {
            kind: FieldSpec::Exact(name.kind.clone()),
            date: FieldSpec::Exact(name.date),
            index: FieldSpec::Exact(name.index),
        }
    }
}

impl fmt::Display for SessionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name(&Naming::default()))
    }
}

fn validate_kind(kind: FieldSpec<String>) -> Result<FieldSpec<String>, ShelfError> {
    match &kind {
        FieldSpec::Exact(token) => {
            parsing::session_kind(token)?;
        }
        FieldSpec::AnyOf(tokens) => {
            for token in tokens {
                parsing::session_kind(token)?;
            }
        }
        FieldSpec::Unconstrained | FieldSpec::Dynamic(_) => {}
    }
    Ok(kind)
}

fn placeholder<T>(field: &FieldSpec<T>, any: &str) -> String {
    match field {
        FieldSpec::Unconstrained => any.to_string(),
        FieldSpec::AnyOf(_) => "<multiple>".to_string(),
        FieldSpec::Dynamic(_) => "<dynamic>".to_string(),
        FieldSpec::Exact(_) => unreachable!("exact fields render their value"),
    }
}
