use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::config::Naming;
use crate::error::ShelfError;
use crate::field::FieldSpec;
use crate::filespec::FileSpec;
use crate::parsing::{self, SessionName};
use crate::sessionspec::SessionSpec;
use crate::status::{Level, Mode, SelectionStatus};

/// A declarative, possibly-partial specification of a location in the
/// subject/session/domain/file hierarchy. Immutable; every transform
/// returns a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    mode: Mode,
    root: Utf8PathBuf,
    naming: Naming,
    subject: FieldSpec<String>,
    session: SessionSpec,
    domain: FieldSpec<String>,
    file: FileSpec,
}

/// Sparse override set for [`Predicate::patch`].
#[derive(Debug, Default)]
pub struct Patch {
    pub mode: Option<Mode>,
    pub root: Option<Utf8PathBuf>,
    pub subject: Option<FieldSpec<String>>,
    pub session: Option<SessionSpec>,
    pub domain: Option<FieldSpec<String>>,
    pub file: Option<FileSpec>,
}

impl Predicate {
    pub fn new(mode: Mode, root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            mode,
            root: root.into(),
            naming: Naming::default(),
            subject: FieldSpec::Unconstrained,
            session: SessionSpec::unspecified(),
            domain: FieldSpec::Unconstrained,
            file: FileSpec::unspecified(),
        }
    }

    /// Reverse-parses a path under `root` into a predicate. One to four
    /// relative components select the subject/session/domain/file tiers.
    pub fn from_path(mode: Mode, root: &Utf8Path, path: &Utf8Path) -> Result<Self, ShelfError> {
        let relative = path.strip_prefix(root).map_err(|_| {
            ShelfError::InvalidSpecification(format!("path is not under the root: {path}"))
        })?;
        let components = relative
            .components()
            .filter_map(|component| match component {
                Utf8Component::Normal(name) => Some(name),
                _ => None,
            })
            .collect::<Vec<_>>();

        let mut predicate = Self::new(mode, root);
        if let Some(subject) = components.first() {
            predicate.subject = FieldSpec::Exact(parsing::plain_name(subject)?);
        }
        if let Some(session) = components.get(1) {
            predicate.session = SessionSpec::from_name(session)?;
        }
        if let Some(domain) = components.get(2) {
            predicate.domain = FieldSpec::Exact(parsing::plain_name(domain)?);
        }
        if let Some(file) = components.get(3) {
            let parsed = parsing::file_name(file)?;
            if !coherent(&predicate, &parsed) {
                warn!(name = %file, "incoherent file name for its directory path");
            }
            predicate.file = FileSpec::from_token(&parsed.token);
        }
        if components.len() > 4 {
            return Err(ShelfError::InvalidSpecification(format!(
                "path is deeper than the file tier: {path}"
            )));
        }
        Ok(predicate)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    pub fn subject(&self) -> &FieldSpec<String> {
        &self.subject
    }

    pub fn session(&self) -> &SessionSpec {
        &self.session
    }

    pub fn domain(&self) -> &FieldSpec<String> {
        &self.domain
    }

    pub fn file(&self) -> &FileSpec {
        &self.file
    }

    pub fn with_naming(&self, naming: Naming) -> Self {
        Self {
            naming,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_subject(&self, subject: impl Into<FieldSpec<String>>) -> Self {
        Self {
            subject: subject.into(),
            ..self.clone()
        }
    }

    pub fn with_session(&self, session: SessionSpec) -> Self {
        Self {
            session,
            ..self.clone()
        }
    }

    pub fn with_domain(&self, domain: impl Into<FieldSpec<String>>) -> Self {
        Self {
            domain: domain.into(),
            ..self.clone()
        }
    }

    pub fn with_file(&self, file: FileSpec) -> Self {
        Self {
            file,
            ..self.clone()
        }
    }

    /// Produces a sibling value with the overrides applied. With
    /// `clear == true`, every field except `mode`, `root` and the naming
    /// defaults is reset before the overrides land, which retargets the
    /// predicate to an ancestor level or a fresh descendant.
    pub fn patch(&self, clear: bool, patch: Patch) -> Self {
        let base = if clear {
            Self {
                mode: self.mode,
                root: self.root.clone(),
                naming: self.naming.clone(),
                subject: FieldSpec::Unconstrained,
                session: SessionSpec::unspecified(),
                domain: FieldSpec::Unconstrained,
                file: FileSpec::unspecified(),
            }
        } else {
            self.clone()
        };
        Self {
            mode: patch.mode.unwrap_or(base.mode),
            root: patch.root.unwrap_or(base.root),
            naming: base.naming,
            subject: patch.subject.unwrap_or(base.subject),
            session: patch.session.unwrap_or(base.session),
            domain: patch.domain.unwrap_or(base.domain),
            file: patch.file.unwrap_or(base.file),
        }
    }

    /// Retargets to the root level, keeping `mode` and `root`.
    pub fn cleared(&self) -> Self {
        self.patch(true, Patch::default())
    }

    /// Retargets to an ancestor (or the current) level, dropping every
    /// constraint below it.
    pub fn at_level(&self, level: Level) -> Self {
        let mut patch = Patch::default();
        if level >= Level::Subject {
            patch.subject = Some(self.subject.clone());
        }
        if level >= Level::Session {
            patch.session = Some(self.session.clone());
        }
        if level >= Level::Domain {
            patch.domain = Some(self.domain.clone());
        }
        if level >= Level::File {
            patch.file = Some(self.file.clone());
        }
        self.patch(true, patch)
    }

    /// The deepest tier this predicate actually constrains.
    pub fn level(&self) -> Level {
        if !self.file.is_unspecified() {
            Level::File
        } else if !self.domain.is_unconstrained() {
            Level::Domain
        } else if !self.session.is_unspecified() {
            Level::Session
        } else if !self.subject.is_unconstrained() {
            Level::Subject
        } else {
            Level::Root
        }
    }

    fn any_dynamic(&self) -> bool {
        self.subject.is_dynamic()
            || self.session.any_dynamic()
            || self.domain.is_dynamic()
            || self.file.any_dynamic()
    }

    /// Write-intent cardinality, judged from the shape of the specification
    /// alone. Any dynamic field anywhere makes the whole predicate dynamic.
    pub fn write_status(&self) -> SelectionStatus {
        if self.any_dynamic() {
            return SelectionStatus::Dynamic;
        }
        let level = self.level();
        if level == Level::Root {
            return SelectionStatus::Single;
        }
        let status = self.subject.write_status();
        if level == Level::Subject || status != SelectionStatus::Single {
            return status;
        }
        let status = self.session.write_status();
        if level == Level::Session || status != SelectionStatus::Single {
            return status;
        }
        let status = self.domain.write_status();
        if level == Level::Domain || status != SelectionStatus::Single {
            return status;
        }
        self.file.write_status()
    }

    /// Read-time cardinality: enumerates the filesystem at `level()` and
    /// classifies by count.
    pub fn read_status(&self) -> Result<SelectionStatus, ShelfError> {
        if self.level() == Level::Root {
            return Ok(SelectionStatus::Single);
        }
        let found = self.scan_level(self.level())?;
        Ok(SelectionStatus::of_count(found.len()))
    }

    pub fn status(&self) -> Result<SelectionStatus, ShelfError> {
        match self.mode {
            Mode::Read => self.read_status(),
            Mode::Write | Mode::Append => Ok(self.write_status()),
        }
    }

    /// The concrete path this predicate denotes. Defined only when
    /// `status()` is `Single`.
    pub fn path(&self) -> Result<Utf8PathBuf, ShelfError> {
        match self.status()? {
            SelectionStatus::Single => {}
            status @ (SelectionStatus::Unspecified | SelectionStatus::None) => {
                return Err(ShelfError::UnspecifiedSelection { status });
            }
            status => return Err(ShelfError::AmbiguousSelection { status }),
        }
        match self.level() {
            Level::Root => Ok(self.root.clone()),
            Level::Subject => self.subject_path(),
            Level::Session => self.session_path(),
            Level::Domain => self.domain_path(),
            Level::File => self.file_path(),
        }
    }

    pub fn subject_path(&self) -> Result<Utf8PathBuf, ShelfError> {
        Ok(self.root.join(single_value(&self.subject)?))
    }

    pub fn session_path(&self) -> Result<Utf8PathBuf, ShelfError> {
        Ok(self.subject_path()?.join(self.session.format(&self.naming)?))
    }

    pub fn domain_path(&self) -> Result<Utf8PathBuf, ShelfError> {
        Ok(self.session_path()?.join(single_value(&self.domain)?))
    }

    pub fn file_path(&self) -> Result<Utf8PathBuf, ShelfError> {
        let name = self.file.format_name(
            single_value(&self.subject)?,
            &self.session.format(&self.naming)?,
            single_value(&self.domain)?,
            &self.naming,
        )?;
        Ok(self.domain_path()?.join(name))
    }

    /// Scans the dataset for existing subjects matching this predicate.
    pub fn subjects(&self) -> Result<Vec<Predicate>, ShelfError> {
        self.scan_level(Level::Subject)
    }

    /// Scans the dataset for existing sessions matching this predicate.
    pub fn sessions(&self) -> Result<Vec<Predicate>, ShelfError> {
        self.scan_level(Level::Session)
    }

    /// Scans the dataset for existing domains matching this predicate.
    pub fn domains(&self) -> Result<Vec<Predicate>, ShelfError> {
        self.scan_level(Level::Domain)
    }

    /// Scans the dataset for existing data files matching this predicate.
    pub fn files(&self) -> Result<Vec<Predicate>, ShelfError> {
        self.scan_level(Level::File)
    }

    /// Walks the hierarchy down to `level`, filtering every tier against
    /// this predicate, and returns one exactly-located predicate per match.
    pub fn scan_level(&self, level: Level) -> Result<Vec<Predicate>, ShelfError> {
        if level == Level::Root {
            return Ok(vec![self.clone()]);
        }
        let found = match level {
            Level::Subject => self
                .subject_dirs()?
                .into_iter()
                .map(|entry| self.with_subject(entry.subject))
                .collect::<Vec<_>>(),
            Level::Session => self
                .session_dirs()?
                .into_iter()
                .map(|entry| {
                    self.with_subject(entry.subject)
                        .with_session(SessionSpec::from(&entry.session))
                })
                .collect(),
            Level::Domain => self
                .domain_dirs()?
                .into_iter()
                .map(|entry| {
                    self.with_subject(entry.subject)
                        .with_session(SessionSpec::from(&entry.session))
                        .with_domain(entry.domain)
                })
                .collect(),
            Level::File => self
                .data_files()?
                .into_iter()
                .map(|entry| {
                    self.with_subject(entry.subject)
                        .with_session(SessionSpec::from(&entry.session))
                        .with_domain(entry.domain)
                        .with_file(FileSpec::from_token(&entry.name.token))
                })
                .collect(),
            Level::Root => unreachable!(),
        };
        debug!(level = %level, count = found.len(), "hierarchy scan");
        Ok(found)
    }

    fn subject_dirs(&self) -> Result<Vec<SubjectEntry>, ShelfError> {
        let mut found = Vec::new();
        for name in list_dir(&self.root)? {
            if parsing::plain_name(&name).is_err() {
                continue;
            }
            if self.subject.matches(&name) {
                let path = self.root.join(&name);
                found.push(SubjectEntry {
                    subject: name,
                    path,
                });
            }
        }
        Ok(found)
    }

    fn session_dirs(&self) -> Result<Vec<SessionEntry>, ShelfError> {
        let mut found = Vec::new();
        for subject in self.subject_dirs()? {
            for name in list_dir(&subject.path)? {
                let Ok(session) = parsing::session_name(&name) else {
                    continue;
                };
                if self.session.matches(&session) {
                    let path = subject.path.join(&name);
                    found.push(SessionEntry {
                        subject: subject.subject.clone(),
                        session,
                        path,
                    });
                }
            }
        }
        Ok(found)
    }

    fn domain_dirs(&self) -> Result<Vec<DomainEntry>, ShelfError> {
        let mut found = Vec::new();
        for session in self.session_dirs()? {
            for name in list_dir(&session.path)? {
                if parsing::plain_name(&name).is_err() {
                    continue;
                }
                if self.domain.matches(&name) {
                    let path = session.path.join(&name);
                    found.push(DomainEntry {
                        subject: session.subject.clone(),
                        session: session.session.clone(),
                        domain: name,
                        path,
                    });
                }
            }
        }
        Ok(found)
    }

    fn data_files(&self) -> Result<Vec<FileEntry>, ShelfError> {
        let mut found = Vec::new();
        for domain in self.domain_dirs()? {
            for name in list_dir(&domain.path)? {
                let Ok(parsed) = parsing::file_name(&name) else {
                    continue;
                };
                if parsed.subject != domain.subject
                    || parsed.session != domain.session
                    || parsed.domain != domain.domain
                {
                    warn!(
                        subject = %domain.subject,
                        session = %domain.session,
                        domain = %domain.domain,
                        name = %name,
                        "incoherent file name found during scan"
                    );
                }
                if self.file.matches(&parsed.token) {
                    found.push(FileEntry {
                        subject: domain.subject.clone(),
                        session: domain.session.clone(),
                        domain: domain.domain.clone(),
                        name: parsed,
                    });
                }
            }
        }
        Ok(found)
    }
}

struct SubjectEntry {
    subject: String,
    path: Utf8PathBuf,
}

struct SessionEntry {
    subject: String,
    session: SessionName,
    path: Utf8PathBuf,
}

struct DomainEntry {
    subject: String,
    session: SessionName,
    domain: String,
    path: Utf8PathBuf,
}

struct FileEntry {
    subject: String,
    session: SessionName,
    domain: String,
    name: parsing::FileName,
}

fn coherent(predicate: &Predicate, parsed: &parsing::FileName) -> bool {
    let subject_ok = match predicate.subject.single() {
        Some(subject) => *subject == parsed.subject,
        None => true,
    };
    let session_ok = match predicate.session.single_name() {
        Some(session) => session == parsed.session,
        None => true,
    };
    let domain_ok = match predicate.domain.single() {
        Some(domain) => *domain == parsed.domain,
        None => true,
    };
    subject_ok && session_ok && domain_ok
}

fn single_value<T>(field: &FieldSpec<T>) -> Result<&T, ShelfError> {
    field.single().ok_or_else(|| match field.write_status() {
        status @ (SelectionStatus::Unspecified | SelectionStatus::None) => {
            ShelfError::UnspecifiedSelection { status }
        }
        status => ShelfError::AmbiguousSelection { status },
    })
}

/// Lists the immediate children of `dir` in sorted lexicographic order,
/// skipping hidden and non-UTF-8 entries. A missing directory lists as
/// empty.
fn list_dir(dir: &Utf8Path) -> Result<Vec<String>, ShelfError> {
    if !dir.as_std_path().is_dir() {
        return Ok(Vec::new());
    }
    let entries = dir
        .as_std_path()
        .read_dir()
        .map_err(|err| ShelfError::Filesystem(err.to_string()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ShelfError::Filesystem(err.to_string()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}
