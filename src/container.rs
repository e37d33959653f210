use camino::{Utf8Path, Utf8PathBuf};

use crate::dataio::DriverRegistry;
use crate::error::ShelfError;
use crate::filespec::FileSpec;
use crate::parsing;
use crate::predicate::Predicate;
use crate::sessionspec::SessionSpec;
use crate::status::{Level, Mode};

/// A resolved view at some tier of the hierarchy, dispatched by level.
/// Views only ever reach each other through this factory and `Predicate`.
#[derive(Debug, Clone)]
pub enum Container {
    Dataset(Dataset),
    Subject(Subject),
    Session(Session),
    Domain(Domain),
    DataFile(DataFile),
}

impl Container {
    /// Builds the tier view matching the predicate's level.
    pub fn for_predicate(predicate: Predicate) -> Result<Container, ShelfError> {
        match predicate.level() {
            Level::Root => Dataset::from_predicate(predicate).map(Container::Dataset),
            Level::Subject => Subject::from_predicate(predicate).map(Container::Subject),
            Level::Session => Session::from_predicate(predicate).map(Container::Session),
            Level::Domain => Domain::from_predicate(predicate).map(Container::Domain),
            Level::File => DataFile::from_predicate(predicate).map(Container::DataFile),
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Container::Dataset(_) => Level::Root,
            Container::Subject(_) => Level::Subject,
            Container::Session(_) => Level::Session,
            Container::Domain(_) => Level::Domain,
            Container::DataFile(_) => Level::File,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        match self {
            Container::Dataset(view) => view.predicate(),
            Container::Subject(view) => view.predicate(),
            Container::Session(view) => view.predicate(),
            Container::Domain(view) => view.predicate(),
            Container::DataFile(view) => view.predicate(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        match self {
            Container::Dataset(view) => view.path(),
            Container::Subject(view) => view.path(),
            Container::Session(view) => view.path(),
            Container::Domain(view) => view.path(),
            Container::DataFile(view) => view.path(),
        }
    }
}

/// An adaptor selecting from the children one tier below a view.
#[derive(Debug, Clone)]
pub struct Selector {
    base: Predicate,
    level: Level,
}

impl Selector {
    fn new(base: Predicate, level: Level) -> Self {
        Self { base, level }
    }

    /// Number of existing children, freshly enumerated.
    pub fn len(&self) -> Result<usize, ShelfError> {
        Ok(self.base.scan_level(self.level)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ShelfError> {
        Ok(self.len()? == 0)
    }

    /// Enumerates the existing children as tier views.
    pub fn entries(&self) -> Result<Vec<Container>, ShelfError> {
        self.base
            .scan_level(self.level)?
            .into_iter()
            .map(|found| Container::for_predicate(found.at_level(self.level)))
            .collect()
    }

    /// Looks up one child by name. In `Read` mode a missing child is an
    /// error; in `Write`/`Append` mode the view is built optimistically.
    pub fn get(&self, name: &str) -> Result<Container, ShelfError> {
        let child = match self.level {
            Level::Root => {
                return Err(ShelfError::WrongLevel {
                    level: Level::Root.to_string(),
                });
            }
            Level::Subject => self.base.with_subject(parsing::plain_name(name)?),
            Level::Session => self.base.with_session(SessionSpec::from_name(name)?),
            Level::Domain => self.base.with_domain(parsing::plain_name(name)?),
            Level::File => {
                let parsed = parsing::file_name(name)?;
                self.base.with_file(FileSpec::from_token(&parsed.token))
            }
        };
        let child = child.at_level(self.level);
        if child.mode() == Mode::Read {
            let path = level_path(&child, self.level)?;
            if !path.as_std_path().exists() {
                return Err(ShelfError::NotFound(path.to_string()));
            }
        }
        Container::for_predicate(child)
    }
}

fn level_path(predicate: &Predicate, level: Level) -> Result<Utf8PathBuf, ShelfError> {
    match level {
        Level::Root => Ok(predicate.root().to_path_buf()),
        Level::Subject => predicate.subject_path(),
        Level::Session => predicate.session_path(),
        Level::Domain => predicate.domain_path(),
        Level::File => predicate.file_path(),
    }
}

fn checked(predicate: Predicate, level: Level) -> Result<(Predicate, Utf8PathBuf), ShelfError> {
    if predicate.level() < level {
        return Err(ShelfError::WrongLevel {
            level: predicate.level().to_string(),
        });
    }
    let predicate = predicate.at_level(level);
    let path = level_path(&predicate, level)?;
    if predicate.mode() == Mode::Read && !path.as_std_path().exists() {
        return Err(ShelfError::NotFound(path.to_string()));
    }
    Ok((predicate, path))
}

/// The dataset root directory.
#[derive(Debug, Clone)]
pub struct Dataset {
    predicate: Predicate,
}

impl Dataset {
    /// Binds a dataset root. In `Read` mode the directory must exist.
    pub fn open(root: impl Into<Utf8PathBuf>, mode: Mode) -> Result<Self, ShelfError> {
        Self::from_predicate(Predicate::new(mode, root))
    }

    pub fn from_predicate(predicate: Predicate) -> Result<Self, ShelfError> {
        let (predicate, _) = checked(predicate, Level::Root)?;
        Ok(Self { predicate })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn path(&self) -> &Utf8Path {
        self.predicate.root()
    }

    pub fn with_mode(&self, mode: Mode) -> Result<Self, ShelfError> {
        Self::from_predicate(self.predicate.with_mode(mode))
    }

    pub fn subjects(&self) -> Selector {
        Selector::new(self.predicate.clone(), Level::Subject)
    }

    pub fn get(&self, name: &str) -> Result<Container, ShelfError> {
        self.subjects().get(name)
    }

    /// All sessions in the dataset, across every subject.
    pub fn sessions(&self) -> Result<Vec<Session>, ShelfError> {
        self.predicate
            .sessions()?
            .into_iter()
            .map(|found| Session::from_predicate(found.at_level(Level::Session)))
            .collect()
    }

    /// All domains in the dataset.
    pub fn domains(&self) -> Result<Vec<Domain>, ShelfError> {
        self.predicate
            .domains()?
            .into_iter()
            .map(|found| Domain::from_predicate(found.at_level(Level::Domain)))
            .collect()
    }

    /// All data files in the dataset.
    pub fn files(&self) -> Result<Vec<DataFile>, ShelfError> {
        self.predicate
            .files()?
            .into_iter()
            .map(|found| DataFile::from_predicate(found.at_level(Level::File)))
            .collect()
    }
}

/// A subject directory.
#[derive(Debug, Clone)]
pub struct Subject {
    predicate: Predicate,
    path: Utf8PathBuf,
}

impl Subject {
    pub fn from_predicate(predicate: Predicate) -> Result<Self, ShelfError> {
        let (predicate, path) = checked(predicate, Level::Subject)?;
        Ok(Self { predicate, path })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.predicate
            .subject()
            .single()
            .expect("a subject view always has a single subject")
    }

    pub fn dataset(&self) -> Result<Dataset, ShelfError> {
        Dataset::from_predicate(self.predicate.at_level(Level::Root))
    }

    pub fn sessions(&self) -> Selector {
        Selector::new(self.predicate.clone(), Level::Session)
    }

    pub fn get(&self, name: &str) -> Result<Container, ShelfError> {
        self.sessions().get(name)
    }

    pub fn domains(&self) -> Result<Vec<Domain>, ShelfError> {
        self.predicate
            .domains()?
            .into_iter()
            .map(|found| Domain::from_predicate(found.at_level(Level::Domain)))
            .collect()
    }

    pub fn files(&self) -> Result<Vec<DataFile>, ShelfError> {
        self.predicate
            .files()?
            .into_iter()
            .map(|found| DataFile::from_predicate(found.at_level(Level::File)))
            .collect()
    }
}

/// A session directory under a subject.
#[derive(Debug, Clone)]
pub struct Session {
    predicate: Predicate,
    path: Utf8PathBuf,
}

impl Session {
    pub fn from_predicate(predicate: Predicate) -> Result<Self, ShelfError> {
        let (predicate, path) = checked(predicate, Level::Session)?;
        Ok(Self { predicate, path })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn name(&self) -> Result<String, ShelfError> {
        self.predicate.session().format(self.predicate.naming())
    }

    pub fn subject(&self) -> Result<Subject, ShelfError> {
        Subject::from_predicate(self.predicate.at_level(Level::Subject))
    }

    pub fn domains(&self) -> Selector {
        Selector::new(self.predicate.clone(), Level::Domain)
    }

    pub fn get(&self, name: &str) -> Result<Container, ShelfError> {
        self.domains().get(name)
    }

    pub fn files(&self) -> Result<Vec<DataFile>, ShelfError> {
        self.predicate
            .files()?
            .into_iter()
            .map(|found| DataFile::from_predicate(found.at_level(Level::File)))
            .collect()
    }
}

/// A domain directory under a session.
#[derive(Debug, Clone)]
pub struct Domain {
    predicate: Predicate,
    path: Utf8PathBuf,
}

impl Domain {
    pub fn from_predicate(predicate: Predicate) -> Result<Self, ShelfError> {
        let (predicate, path) = checked(predicate, Level::Domain)?;
        Ok(Self { predicate, path })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.predicate
            .domain()
            .single()
            .expect("a domain view always has a single domain")
    }

    pub fn session(&self) -> Result<Session, ShelfError> {
        Session::from_predicate(self.predicate.at_level(Level::Session))
    }

    pub fn files(&self) -> Selector {
        Selector::new(self.predicate.clone(), Level::File)
    }

    pub fn get(&self, name: &str) -> Result<Container, ShelfError> {
        self.files().get(name)
    }
}

/// A single data file under a domain.
#[derive(Debug, Clone)]
pub struct DataFile {
    predicate: Predicate,
    path: Utf8PathBuf,
}

impl DataFile {
    pub fn from_predicate(predicate: Predicate) -> Result<Self, ShelfError> {
        let (predicate, path) = checked(predicate, Level::File)?;
        Ok(Self { predicate, path })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    pub fn index(&self) -> Option<u32> {
        self.predicate.file().index().single().copied()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.predicate
            .file()
            .suffix()
            .single()
            .map(String::as_str)
    }

    pub fn domain(&self) -> Result<Domain, ShelfError> {
        Domain::from_predicate(self.predicate.at_level(Level::Domain))
    }

    /// Loads the file contents through the driver resolved for its suffix.
    /// The resolution engine only hands the driver the path; the payload is
    /// opaque.
    pub fn load(&self, registry: &DriverRegistry) -> Result<serde_json::Value, ShelfError> {
        if !self.path.as_std_path().is_file() {
            return Err(ShelfError::NotFound(self.path.to_string()));
        }
        self.driver(registry)?.load(&self.path)
    }

    /// Saves contents through the driver resolved for the suffix. `Read`
    /// mode never writes; `Append` mode refuses to overwrite.
    pub fn save(
        &self,
        registry: &DriverRegistry,
        data: &serde_json::Value,
    ) -> Result<(), ShelfError> {
        match self.predicate.mode() {
            Mode::Read => {
                return Err(ShelfError::InvalidSpecification(
                    "cannot save through a read-mode selection".to_string(),
                ));
            }
            Mode::Append if self.path.as_std_path().exists() => {
                return Err(ShelfError::InvalidSpecification(format!(
                    "append mode refuses to modify an existing file: {}",
                    self.path
                )));
            }
            Mode::Write | Mode::Append => {}
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| ShelfError::Filesystem(err.to_string()))?;
        }
        self.driver(registry)?.save(&self.path, data)
    }

    fn driver<'a>(
        &self,
        registry: &'a DriverRegistry,
    ) -> Result<&'a dyn crate::dataio::DataDriver, ShelfError> {
        let suffix = self
            .suffix()
            .map(str::to_string)
            .or_else(|| self.path.extension().map(|ext| format!(".{ext}")))
            .ok_or_else(|| ShelfError::NoDriver(self.path.to_string()))?;
        registry
            .for_suffix(&suffix)
            .ok_or(ShelfError::NoDriver(suffix))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::filespec::FileSpec;

    #[test]
    fn factory_dispatches_by_level() {
        let predicate = Predicate::new(Mode::Write, "/data");
        assert_matches!(
            Container::for_predicate(predicate.clone()).unwrap(),
            Container::Dataset(_)
        );

        let subject = predicate.with_subject("A1");
        assert_matches!(
            Container::for_predicate(subject.clone()).unwrap(),
            Container::Subject(_)
        );

        let session = subject
            .with_session(crate::sessionspec::SessionSpec::from_name("session2015-11-12-001").unwrap());
        assert_matches!(
            Container::for_predicate(session.clone()).unwrap(),
            Container::Session(_)
        );

        let domain = session.with_domain("behavior");
        assert_matches!(
            Container::for_predicate(domain.clone()).unwrap(),
            Container::Domain(_)
        );

        let file = domain.with_file(
            FileSpec::builder().run(1u32).suffix("dat").build().unwrap(),
        );
        let container = Container::for_predicate(file).unwrap();
        assert_matches!(container, Container::DataFile(_));
        assert_eq!(
            container.path().as_str(),
            "/data/A1/session2015-11-12-001/behavior/A1_session2015-11-12-001_behavior_run00001.dat"
        );
    }

    #[test]
    fn view_construction_rejects_shallower_levels() {
        let predicate = Predicate::new(Mode::Write, "/data");
        assert_matches!(
            Subject::from_predicate(predicate.clone()),
            Err(ShelfError::WrongLevel { .. })
        );
        assert_matches!(
            DataFile::from_predicate(predicate.with_subject("A1")),
            Err(ShelfError::WrongLevel { .. })
        );
    }

    #[test]
    fn write_mode_views_are_optimistic() {
        let dataset = Dataset::open("/nowhere-at-all", Mode::Write).unwrap();
        let subject = dataset.get("A9").unwrap();
        assert_eq!(subject.path().as_str(), "/nowhere-at-all/A9");
    }

    #[test]
    fn read_mode_open_requires_the_root() {
        assert_matches!(
            Dataset::open("/nowhere-at-all", Mode::Read),
            Err(ShelfError::NotFound(_))
        );
    }
}
