use std::collections::BTreeSet;

use crate::config::Naming;
use crate::error::ShelfError;
use crate::field::FieldSpec;
use crate::parsing::{self, BlockKind, FileToken};
use crate::status::SelectionStatus;

/// A structured, possibly-partial data-file identifier: an optional keyed
/// index block (`run`/`trial`), a channel list, and a suffix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSpec {
    kind: Option<BlockKind>,
    index: FieldSpec<u32>,
    channels: FieldSpec<Vec<String>>,
    suffix: FieldSpec<String>,
}

impl FileSpec {
    pub fn unspecified() -> Self {
        Self::default()
    }

    pub fn builder() -> FileSpecBuilder {
        FileSpecBuilder::default()
    }

    pub fn run(index: u32) -> Self {
        Self {
            kind: Some(BlockKind::Run),
            index: FieldSpec::Exact(index),
            ..Self::default()
        }
    }

    pub fn trial(index: u32) -> Self {
        Self {
            kind: Some(BlockKind::Trial),
            index: FieldSpec::Exact(index),
            ..Self::default()
        }
    }

    /// Exact spec for a parsed file token.
    pub fn from_token(token: &FileToken) -> Self {
        Self {
            kind: token.block.map(|(kind, _)| kind),
            index: match token.block {
                Some((_, index)) => FieldSpec::Exact(index),
                None => FieldSpec::Unconstrained,
            },
            channels: if token.channels.is_empty() {
                FieldSpec::Unconstrained
            } else {
                FieldSpec::Exact(token.channels.clone())
            },
            suffix: match &token.suffix {
                Some(suffix) => FieldSpec::Exact(suffix.clone()),
                None => FieldSpec::Unconstrained,
            },
        }
    }

    /// Parses the trailing file-token portion of a file name.
    pub fn from_name(value: &str) -> Result<Self, ShelfError> {
        Ok(Self::from_token(&parsing::file_token(value)?))
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.kind
    }

    pub fn index(&self) -> &FieldSpec<u32> {
        &self.index
    }

    pub fn channels(&self) -> &FieldSpec<Vec<String>> {
        &self.channels
    }

    pub fn suffix(&self) -> &FieldSpec<String> {
        &self.suffix
    }

    pub fn with_channels(&self, channels: FieldSpec<Vec<String>>) -> Self {
        Self {
            channels,
            ..self.clone()
        }
    }

    pub fn with_suffix(&self, suffix: FieldSpec<String>) -> Self {
        Self {
            suffix: normalize_suffix(suffix),
            ..self.clone()
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.kind.is_none()
            && self.index.is_unconstrained()
            && self.channels.is_unconstrained()
            && self.suffix.is_unconstrained()
    }

    pub fn any_dynamic(&self) -> bool {
        self.index.is_dynamic() || self.channels.is_dynamic() || self.suffix.is_dynamic()
    }

    /// Write-intent cardinality. Unconstrained channel/suffix fields next to
    /// a constrained block are omitted name parts, not ambiguity: formatting
    /// emits nothing for them.
    pub fn write_status(&self) -> SelectionStatus {
        let block = match self.kind {
            None => SelectionStatus::Unspecified,
            Some(_) => match self.index.write_status() {
                SelectionStatus::Unspecified => SelectionStatus::Multiple,
                status => status,
            },
        };
        let constrained = [
            block,
            self.channels.write_status(),
            self.suffix.write_status(),
        ]
        .into_iter()
        .filter(|status| *status != SelectionStatus::Unspecified)
        .collect::<Vec<_>>();
        if constrained.is_empty() {
            SelectionStatus::Unspecified
        } else {
            SelectionStatus::combine(constrained)
        }
    }

    /// Tests a concrete file token against every field.
    pub fn matches(&self, candidate: &FileToken) -> bool {
        let block_ok = match self.kind {
            None => true,
            Some(kind) => match candidate.block {
                Some((candidate_kind, index)) => candidate_kind == kind && self.index.matches(&index),
                None => false,
            },
        };
        let suffix_ok = match (&self.suffix, &candidate.suffix) {
            (FieldSpec::Unconstrained, _) => true,
            (spec, Some(suffix)) => spec.matches(suffix),
            (_, None) => false,
        };
        block_ok && suffix_ok && self.channels.matches(&candidate.channels)
    }

    /// The single file token this spec denotes, if it denotes exactly one
    /// name shape.
    pub fn single_token(&self) -> Option<FileToken> {
        let block = match self.kind {
            None => None,
            Some(kind) => Some((kind, *self.index.single()?)),
        };
        let channels = match &self.channels {
            FieldSpec::Unconstrained => Vec::new(),
            spec => spec.single()?.clone(),
        };
        let suffix = match &self.suffix {
            FieldSpec::Unconstrained => None,
            spec => Some(spec.single()?.clone()),
        };
        Some(FileToken {
            block,
            channels,
            suffix,
        })
    }

    /// Formats the trailing portion of the file name (block + channels +
    /// suffix), leading separator included when non-empty.
    pub fn format_token(&self, naming: &Naming) -> Result<String, ShelfError> {
        let Some(token) = self.single_token() else {
            return Err(self.not_single_error());
        };
        let block = match token.block {
            Some((kind, index)) => parsing::format_block(kind, index, naming.file_index_width)?,
            None => String::new(),
        };
        Ok(format!(
            "{block}{}{}",
            parsing::format_channels(&token.channels),
            token.suffix.as_deref().unwrap_or(""),
        ))
    }

    /// Formats a complete file name in the context of the path tiers above.
    pub fn format_name(
        &self,
        subject: &str,
        session_name: &str,
        domain: &str,
        naming: &Naming,
    ) -> Result<String, ShelfError> {
        Ok(format!(
            "{subject}_{session_name}_{domain}{}",
            self.format_token(naming)?
        ))
    }

    fn not_single_error(&self) -> ShelfError {
        match self.write_status() {
            status @ (SelectionStatus::Unspecified | SelectionStatus::None) => {
                ShelfError::UnspecifiedSelection { status }
            }
            status => ShelfError::AmbiguousSelection { status },
        }
    }
}

/// Fallible constructor enforcing the keyword rules: `run` and `trial` are
/// mutually exclusive, and the explicit `kind`/`index` pair cannot be mixed
/// with either legacy keyword.
#[derive(Debug, Default)]
pub struct FileSpecBuilder {
    kind: Option<BlockKind>,
    index: Option<FieldSpec<u32>>,
    run: Option<FieldSpec<u32>>,
    trial: Option<FieldSpec<u32>>,
    channels: FieldSpec<Vec<String>>,
    suffix: FieldSpec<String>,
}

impl FileSpecBuilder {
    pub fn kind(mut self, kind: BlockKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn index(mut self, index: impl Into<FieldSpec<u32>>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn run(mut self, index: impl Into<FieldSpec<u32>>) -> Self {
        self.run = Some(index.into());
        self
    }

    pub fn trial(mut self, index: impl Into<FieldSpec<u32>>) -> Self {
        self.trial = Some(index.into());
        self
    }

    pub fn channel(mut self, channel: &str) -> Self {
        self.channels = FieldSpec::Exact(vec![channel.to_string()]);
        self
    }

    pub fn channels(mut self, channels: FieldSpec<Vec<String>>) -> Self {
        self.channels = channels;
        self
    }

    pub fn suffix(mut self, suffix: impl Into<FieldSpec<String>>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn build(self) -> Result<FileSpec, ShelfError> {
        if self.run.is_some() && self.trial.is_some() {
            return Err(ShelfError::InvalidSpecification(
                "'run' and 'trial' are mutually exclusive".to_string(),
            ));
        }
        if self.kind.is_some() && (self.run.is_some() || self.trial.is_some()) {
            return Err(ShelfError::InvalidSpecification(
                "an explicit block kind cannot be combined with 'run'/'trial'".to_string(),
            ));
        }

        let (kind, index) = if let Some(index) = self.run {
            (Some(BlockKind::Run), index)
        } else if let Some(index) = self.trial {
            (Some(BlockKind::Trial), index)
        } else {
            match (self.kind, self.index) {
                (Some(kind), Some(index)) => (Some(kind), index),
                (Some(kind), None) => (Some(kind), FieldSpec::Unconstrained),
                (None, Some(_)) => {
                    return Err(ShelfError::InvalidSpecification(
                        "an index requires a 'run' or 'trial' block kind".to_string(),
                    ));
                }
                (None, None) => (None, FieldSpec::Unconstrained),
            }
        };

        Ok(FileSpec {
            kind,
            index,
            channels: self.channels,
            suffix: normalize_suffix(self.suffix),
        })
    }
}

fn normalize_one_suffix(suffix: &str) -> Option<String> {
    let suffix = suffix.trim();
    if suffix.is_empty() {
        None
    } else if suffix.starts_with('.') {
        Some(suffix.to_string())
    } else {
        Some(format!(".{suffix}"))
    }
}

fn normalize_suffix(suffix: FieldSpec<String>) -> FieldSpec<String> {
    match suffix {
        FieldSpec::Exact(value) => match normalize_one_suffix(&value) {
            Some(normalized) => FieldSpec::Exact(normalized),
            None => FieldSpec::Unconstrained,
        },
        FieldSpec::AnyOf(values) => {
            let normalized = values
                .iter()
                .filter_map(|value| normalize_one_suffix(value))
                .collect::<BTreeSet<_>>();
            if normalized.is_empty() {
                FieldSpec::Unconstrained
            } else {
                FieldSpec::AnyOf(normalized)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn suffix_normalization() {
        let spec = FileSpec::builder().suffix("csv").build().unwrap();
        assert_eq!(spec.suffix().single().map(String::as_str), Some(".csv"));

        let spec = FileSpec::builder().suffix(".json").build().unwrap();
        assert_eq!(spec.suffix().single().map(String::as_str), Some(".json"));

        let spec = FileSpec::builder().suffix("").build().unwrap();
        assert!(spec.suffix().is_unconstrained());
    }

    #[test]
    fn keyword_exclusivity() {
        let err = FileSpec::builder().run(1u32).trial(2u32).build().unwrap_err();
        assert_matches!(err, ShelfError::InvalidSpecification(_));

        let err = FileSpec::builder()
            .kind(BlockKind::Run)
            .trial(1u32)
            .build()
            .unwrap_err();
        assert_matches!(err, ShelfError::InvalidSpecification(_));

        let err = FileSpec::builder().index(1u32).build().unwrap_err();
        assert_matches!(err, ShelfError::InvalidSpecification(_));
    }

    #[test]
    fn write_status() {
        assert_eq!(
            FileSpec::unspecified().write_status(),
            SelectionStatus::Unspecified
        );
        assert_eq!(FileSpec::run(1).write_status(), SelectionStatus::Single);

        let spec = FileSpec::builder()
            .kind(BlockKind::Run)
            .index(FieldSpec::any_of([1, 3]))
            .build()
            .unwrap();
        assert_eq!(spec.write_status(), SelectionStatus::Multiple);

        // a kind without an index denotes every index
        let spec = FileSpec::builder().kind(BlockKind::Trial).build().unwrap();
        assert_eq!(spec.write_status(), SelectionStatus::Multiple);

        let spec = FileSpec::builder()
            .run(FieldSpec::dynamic(|idx: &u32| idx % 2 == 0))
            .build()
            .unwrap();
        assert_eq!(spec.write_status(), SelectionStatus::Dynamic);

        // suffix alone is a single name shape
        let spec = FileSpec::builder().suffix("csv").build().unwrap();
        assert_eq!(spec.write_status(), SelectionStatus::Single);
    }

    #[test]
    fn formatting() {
        let naming = Naming::default();
        assert_eq!(FileSpec::run(1).format_token(&naming).unwrap(), "_run00001");
        assert_eq!(
            FileSpec::trial(12)
                .with_suffix(FieldSpec::from("dat"))
                .format_token(&naming)
                .unwrap(),
            "_trial00012.dat"
        );

        let spec = FileSpec::builder()
            .run(3u32)
            .channels(FieldSpec::Exact(vec![
                "chanA".to_string(),
                "chanB".to_string(),
            ]))
            .suffix("dat")
            .build()
            .unwrap();
        assert_eq!(
            spec.format_name("A1", "session2015-12-11-001", "scanimage", &naming)
                .unwrap(),
            "A1_session2015-12-11-001_scanimage_run00003_chanA-chanB.dat"
        );
    }

    #[test]
    fn format_requires_single() {
        let naming = Naming::default();
        let spec = FileSpec::builder()
            .run(FieldSpec::any_of([1u32, 2]))
            .build()
            .unwrap();
        assert_matches!(
            spec.format_token(&naming),
            Err(ShelfError::AmbiguousSelection { .. })
        );
    }

    #[test]
    fn matching() {
        let token = parsing::file_token("run00002_chanA.dat").unwrap();

        assert!(FileSpec::unspecified().matches(&token));
        assert!(
            FileSpec::builder()
                .run(FieldSpec::any_of([1u32, 2]))
                .build()
                .unwrap()
                .matches(&token)
        );
        assert!(!FileSpec::run(3).matches(&token));
        assert!(!FileSpec::trial(2).matches(&token));

        let by_suffix = FileSpec::builder().suffix("dat").build().unwrap();
        assert!(by_suffix.matches(&token));
        let by_suffix = FileSpec::builder().suffix("csv").build().unwrap();
        assert!(!by_suffix.matches(&token));

        let by_channel = FileSpec::builder().channel("chanA").build().unwrap();
        assert!(by_channel.matches(&token));
        let by_channel = FileSpec::builder().channel("chanB").build().unwrap();
        assert!(!by_channel.matches(&token));

        let by_dynamic = FileSpec::builder()
            .run(FieldSpec::dynamic(|idx: &u32| idx % 2 == 0))
            .build()
            .unwrap();
        assert!(by_dynamic.matches(&token));
    }

    #[test]
    fn round_trip_from_parsed_token() {
        let naming = Naming::default();
        let raw = "trial00042_chanA-chanB.json";
        let spec = FileSpec::from_name(raw).unwrap();
        assert_eq!(spec.write_status(), SelectionStatus::Single);
        assert_eq!(spec.format_token(&naming).unwrap(), format!("_{raw}"));
    }
}
