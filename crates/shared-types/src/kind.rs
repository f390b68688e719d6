use serde::{Deserialize, Serialize};
use std::fmt;

/// The business record kinds that hang off a claim and carry attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Appeal,
    Decision,
    Recourse,
    Settlement,
    ClientClaim,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Appeal,
        EntityKind::Decision,
        EntityKind::Recourse,
        EntityKind::Settlement,
        EntityKind::ClientClaim,
    ];

    /// REST collection segment, e.g. `appeals` in `/api/appeals`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            EntityKind::Appeal => "appeals",
            EntityKind::Decision => "decisions",
            EntityKind::Recourse => "recourses",
            EntityKind::Settlement => "settlements",
            EntityKind::ClientClaim => "client-claims",
        }
    }

    /// Parse a REST collection segment. Unknown segments yield `None`.
    pub fn from_path_segment(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.path_segment() == s)
    }

    /// Singular label used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Appeal => "appeal",
            EntityKind::Decision => "decision",
            EntityKind::Recourse => "recourse",
            EntityKind::Settlement => "settlement",
            EntityKind::ClientClaim => "client claim",
        }
    }

    /// Kinds whose backend still stores a single flat `documentPath`/`documentName`.
    pub fn uses_legacy_document(&self) -> bool {
        matches!(self, EntityKind::ClientClaim)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}
