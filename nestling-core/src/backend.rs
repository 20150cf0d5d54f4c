use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two backends an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite, relational schema.
    #[default]
    #[serde(alias = "supabase")]
    Relational,
    /// Automerge documents, document schema.
    #[serde(alias = "convex")]
    Document,
}

impl BackendKind {
    /// The backend that is not `self`.
    pub fn other(self) -> Self {
        match self {
            BackendKind::Relational => BackendKind::Document,
            BackendKind::Document => BackendKind::Relational,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Relational => "relational",
            BackendKind::Document => "document",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relational" | "supabase" => Ok(BackendKind::Relational),
            "document" | "convex" => Ok(BackendKind::Document),
            _ => Err(format!(
                "Invalid backend '{}'. Valid options: relational, document",
                s
            )),
        }
    }
}

/// How a service routes its create/update/delete calls.
///
/// Chosen per service, so one record type can be mirrored to both backends
/// while another only ever touches the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WritePolicy {
    /// Write to the active backend only.
    #[default]
    Active,
    /// Write to both backends concurrently; `primary` decides success.
    Dual { primary: BackendKind },
}

impl WritePolicy {
    pub fn is_dual(&self) -> bool {
        matches!(self, WritePolicy::Dual { .. })
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::Active => write!(f, "active"),
            WritePolicy::Dual { primary } => write!(f, "dual (primary: {})", primary),
        }
    }
}
