//! Registry-driven persistence
//!
//! Scenes, layers and components are saved to and rebuilt from a JSON
//! document through function registries keyed by type tag. Loading is
//! all-or-nothing: the document is fully materialized into temporary scenes
//! and only handed to the caller on complete success, so a malformed save
//! never leaves a half-built world behind.

mod loader;
mod registry;

pub use loader::{
    load_from_file, load_state, save_state, save_to_file, LoadedState, STATE_VERSION,
};
pub use registry::{
    ComponentLoadFn, ComponentSaveFn, LayerLoadFn, LayerSaveFn, SceneConstructFn, SceneSaveFn,
    StateRegistry,
};

use std::error::Error;
use std::fmt;
use std::io;

/// Persistence failure.
#[derive(Debug)]
pub enum StateError {
    /// A tag was registered twice in the same registry table
    DuplicateRegistration {
        /// Table kind ("scene", "layer", "component")
        kind: &'static str,
        tag: String,
    },
    /// A tag in the document (or on a live component) has no registration
    UnregisteredType {
        kind: &'static str,
        tag: String,
    },
    /// A required field is absent
    MissingField {
        /// Node kind the field was expected on
        node: &'static str,
        field: &'static str,
    },
    /// A field is present but has the wrong JSON type or shape
    WrongFieldType {
        node: &'static str,
        field: &'static str,
    },
    /// Reading or writing the backing file failed
    Io(io::Error),
    /// The backing file is not valid JSON
    Parse(serde_json::Error),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRegistration { kind, tag } => {
                write!(f, "{kind} type '{tag}' is already registered")
            }
            Self::UnregisteredType { kind, tag } => {
                write!(f, "no {kind} type registered for tag '{tag}'")
            }
            Self::MissingField { node, field } => {
                write!(f, "{node} node is missing field '{field}'")
            }
            Self::WrongFieldType { node, field } => {
                write!(f, "{node} field '{field}' has the wrong type")
            }
            Self::Io(err) => write!(f, "state file io error: {err}"),
            Self::Parse(err) => write!(f, "state file parse error: {err}"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StateError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}
