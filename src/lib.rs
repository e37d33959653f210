//! Predicate-based resolution of subject/session/domain/file dataset
//! hierarchies on disk.
//!
//! A [`Predicate`] is a declarative, possibly-partial specification of a
//! location in a four-level directory hierarchy with a strict naming
//! grammar. It classifies itself into a [`SelectionStatus`] (by the shape of
//! the specification in write mode, by fresh filesystem enumeration in read
//! mode), computes the unique path it denotes when that status is `Single`,
//! and scans the hierarchy deterministically for matching entries.
//! [`Dataset`] and the other container views bind predicates to browsing
//! operations; the [`dataio`] registry handles file contents, which the core
//! itself never touches.

pub mod config;
pub mod container;
pub mod dataio;
pub mod error;
pub mod field;
pub mod filespec;
pub mod parsing;
pub mod predicate;
pub mod sessionspec;
pub mod status;

pub use config::Naming;
pub use container::{Container, DataFile, Dataset, Domain, Selector, Session, Subject};
pub use dataio::{DataDriver, DataKind, DriverRegistry, JsonDriver};
pub use error::ShelfError;
pub use field::FieldSpec;
pub use filespec::{FileSpec, FileSpecBuilder};
pub use parsing::{BlockKind, FileName, FileToken, SessionName};
pub use predicate::{Patch, Predicate};
pub use sessionspec::SessionSpec;
pub use status::{Level, Mode, SelectionStatus};
