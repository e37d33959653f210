use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

pub const SEP: char = '_';
pub const CHAN_SEP: char = '-';
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+").unwrap());
static SESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9-]*[A-Za-z])(\d{4})-(\d{2})-(\d{2})-(\d+)").unwrap());
static KIND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]*[A-Za-z]$").unwrap());
static INDEX_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+").unwrap());
static CHAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+").unwrap());

/// A concrete session identifier as it appears in a directory name:
/// `<kind><YYYY>-<MM>-<DD>-<index>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionName {
    pub kind: String,
    pub date: NaiveDate,
    pub index: u32,
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // display with the default session-index width
        match format_session_name(self, crate::config::SESSION_INDEX_WIDTH) {
            Ok(name) => write!(f, "{name}"),
            Err(_) => write!(f, "{}{}-{}", self.kind, self.date.format(DATE_FORMAT), self.index),
        }
    }
}

impl FromStr for SessionName {
    type Err = ShelfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        session_name(value)
    }
}

/// The two mutually exclusive labels for a file's index block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Run,
    Trial,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Run => "run",
            BlockKind::Trial => "trial",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The trailing portion of a data-file name: an optional keyed index block,
/// channel tokens, and a suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileToken {
    pub block: Option<(BlockKind, u32)>,
    pub channels: Vec<String>,
    pub suffix: Option<String>,
}

/// A fully parsed data-file name, including the subject/session/domain
/// tokens embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    pub subject: String,
    pub session: SessionName,
    pub domain: String,
    pub token: FileToken,
}

/// Validates a bare session-kind token. It must end in a letter, which
/// disambiguates the kind from the leading digits of the date.
pub fn session_kind(value: &str) -> Result<String, ShelfError> {
    if KIND_PATTERN.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(ShelfError::InvalidSessionType(value.to_string()))
    }
}

pub fn session_date(value: &str) -> Result<NaiveDate, ShelfError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|err| ShelfError::InvalidDate(format!("'{value}' ({err})")))
}

pub fn session_index(value: &str) -> Result<u32, ShelfError> {
    let index = value
        .trim()
        .parse::<i64>()
        .map_err(|_| ShelfError::InvalidIndex(value.to_string()))?;
    u32::try_from(index).map_err(|_| ShelfError::InvalidIndex(value.to_string()))
}

/// Parses a session name at the start of `value`, returning the remainder.
pub fn session_prefix(value: &str) -> Result<(SessionName, &str), ShelfError> {
    let captures = SESSION_PATTERN
        .captures(value)
        .ok_or_else(|| ShelfError::InvalidSessionName(value.to_string()))?;
    let matched = captures.get(0).unwrap();
    let (year, month, day) = (&captures[2], &captures[3], &captures[4]);
    let date = session_date(&format!("{year}-{month}-{day}"))?;
    let index = captures[5]
        .parse::<u32>()
        .map_err(|_| ShelfError::InvalidIndex(captures[5].to_string()))?;
    let name = SessionName {
        kind: captures[1].to_string(),
        date,
        index,
    };
    Ok((name, &value[matched.end()..]))
}

/// Parses a complete session directory name.
pub fn session_name(value: &str) -> Result<SessionName, ShelfError> {
    let (name, rest) = session_prefix(value)?;
    if !rest.is_empty() {
        return Err(ShelfError::InvalidSessionName(value.to_string()));
    }
    Ok(name)
}

/// Validates a subject or domain directory name.
pub fn plain_name(value: &str) -> Result<String, ShelfError> {
    match NAME_PATTERN.find(value) {
        Some(found) if found.end() == value.len() => Ok(value.to_string()),
        _ => Err(ShelfError::InvalidName(value.to_string())),
    }
}

fn strip_sep(value: &str, sep: char) -> &str {
    value.trim_start_matches(sep)
}

fn keyed_index<'a>(
    value: &'a str,
    kind: BlockKind,
) -> Result<(Option<(BlockKind, u32)>, &'a str), ShelfError> {
    let Some(rest) = value.strip_prefix(kind.as_str()) else {
        return Ok((None, value));
    };
    let digits = INDEX_PATTERN
        .find(rest)
        .ok_or_else(|| ShelfError::UnindexedBlock {
            keyword: kind.as_str(),
            rest: rest.to_string(),
        })?;
    let index = digits
        .as_str()
        .parse::<u32>()
        .map_err(|_| ShelfError::InvalidIndex(digits.as_str().to_string()))?;
    Ok((Some((kind, index)), strip_sep(&rest[digits.end()..], SEP)))
}

/// Parses the file token: at most one `run<digits>`/`trial<digits>` block,
/// then channel tokens joined by `-`, then a `.`-initial suffix.
pub fn file_token(value: &str) -> Result<FileToken, ShelfError> {
    let (run, rest) = keyed_index(value, BlockKind::Run)?;
    let (trial, mut rest) = keyed_index(rest, BlockKind::Trial)?;
    let block = match (run, trial) {
        (Some(_), Some(_)) => {
            return Err(ShelfError::InvalidFileName(value.to_string()));
        }
        (run, trial) => run.or(trial),
    };

    let mut channels = Vec::new();
    let mut suffix = None;
    while !rest.is_empty() {
        if rest.starts_with('.') {
            suffix = Some(rest.to_string());
            break;
        }
        let chan = CHAN_PATTERN
            .find(rest)
            .ok_or_else(|| ShelfError::InvalidChannel(rest.to_string()))?;
        channels.push(chan.as_str().to_string());
        rest = &rest[chan.end()..];
        if let Some(stripped) = rest.strip_prefix(CHAN_SEP) {
            rest = stripped;
        } else if !rest.is_empty() && !rest.starts_with('.') {
            return Err(ShelfError::InvalidChannel(rest.to_string()));
        }
    }

    Ok(FileToken {
        block,
        channels,
        suffix,
    })
}

/// Parses a complete data-file name:
/// `<subject>_<sessionName>_<domain>[_run<N>|_trial<N>][_<chan>[-<chan>..]][<suffix>]`.
pub fn file_name(value: &str) -> Result<FileName, ShelfError> {
    let subject = NAME_PATTERN
        .find(value)
        .ok_or_else(|| ShelfError::InvalidFileName(value.to_string()))?;
    let rest = strip_sep(&value[subject.end()..], SEP);

    let (session, rest) = session_prefix(rest)?;
    let rest = strip_sep(rest, SEP);

    let domain = NAME_PATTERN
        .find(rest)
        .ok_or_else(|| ShelfError::InvalidFileName(value.to_string()))?;
    let token = file_token(strip_sep(&rest[domain.end()..], SEP))?;

    Ok(FileName {
        subject: subject.as_str().to_string(),
        session,
        domain: domain.as_str().to_string(),
        token,
    })
}

fn zero_pad(index: u32, width: usize) -> Result<String, ShelfError> {
    let digits = index.to_string();
    if digits.len() > width {
        return Err(ShelfError::IndexWidth { index, width });
    }
    Ok(format!("{index:0width$}"))
}

pub fn format_session_index(index: u32, width: usize) -> Result<String, ShelfError> {
    zero_pad(index, width)
}

pub fn format_session_name(name: &SessionName, width: usize) -> Result<String, ShelfError> {
    Ok(format!(
        "{}{}-{}",
        name.kind,
        name.date.format(DATE_FORMAT),
        zero_pad(name.index, width)?
    ))
}

/// Formats the keyed index block, leading separator included.
pub fn format_block(kind: BlockKind, index: u32, width: usize) -> Result<String, ShelfError> {
    Ok(format!("{SEP}{kind}{}", zero_pad(index, width)?))
}

/// Formats the channel list, leading separator included; empty for no channels.
pub fn format_channels(channels: &[String]) -> String {
    if channels.is_empty() {
        String::new()
    } else {
        format!("{SEP}{}", channels.join(&CHAN_SEP.to_string()))
    }
}
