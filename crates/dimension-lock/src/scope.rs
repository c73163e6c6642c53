//! Lock scopes
//!
//! A scope names the class of mesh-wide operation being serialized.
//! Scopes are strictly prioritized: an active higher-priority scope
//! blocks prevention of every lower-priority one, so an upgrade can
//! always starve out routine catalog work but never the reverse.

use dimension_core::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The classes of mesh-wide exclusive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    /// Software upgrade of the mesh itself; highest priority
    Upgrade,

    /// Multi-step orchestration across peers
    Orchestration,

    /// Exclusive catalog mutation; lowest priority
    Catalog,
}

impl Scope {
    /// All scopes in priority order, highest first
    pub const ALL: [Scope; 3] = [Scope::Upgrade, Scope::Orchestration, Scope::Catalog];

    /// Priority rank; lower is higher priority
    pub fn priority(&self) -> u8 {
        match self {
            Scope::Upgrade => 0,
            Scope::Orchestration => 1,
            Scope::Catalog => 2,
        }
    }

    /// Whether activity in this scope blocks prevention of `other`
    pub fn preempts(&self, other: Scope) -> bool {
        self.priority() < other.priority()
    }

    /// Scopes of strictly higher priority than this one
    pub fn higher_priority(&self) -> impl Iterator<Item = Scope> + '_ {
        Scope::ALL
            .into_iter()
            .filter(|s| s.priority() < self.priority())
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Upgrade => "UPGRADE",
            Scope::Orchestration => "ORCHESTRATION",
            Scope::Catalog => "CATALOG",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPGRADE" => Ok(Scope::Upgrade),
            "ORCHESTRATION" => Ok(Scope::Orchestration),
            "CATALOG" => Ok(Scope::Catalog),
            other => Err(Error::UnknownScope {
                name: other.to_string(),
            }),
        }
    }
}
