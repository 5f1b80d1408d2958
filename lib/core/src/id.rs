//! Identifier types.
//!
//! Locally generated identifiers (workflow runs) use ULID, giving both
//! uniqueness and temporal ordering in logs. Identifiers minted by the remote
//! cluster (task tags, entity and node UUIDs) are opaque strings the engine
//! only carries around and never interprets.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique identifier for a single workflow run.
///
/// Displayed as `run_<ULID>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Ulid);

impl RunId {
    const PREFIX: &'static str = "run_";

    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

/// Generates a newtype over an opaque identifier issued by the cluster.
macro_rules! define_remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_remote_id!(
    /// Handle of an asynchronous task running on the cluster.
    TaskTag
);

define_remote_id!(
    /// UUID of an entity (virtual machine, block device) created on the cluster.
    EntityUuid
);

define_remote_id!(
    /// UUID of a cluster node; the unit a migration target is chosen from.
    NodeUuid
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_display_format() {
        let id = RunId::new();
        assert!(id.to_string().starts_with("run_"));
        assert_ne!(id, RunId::new());
    }

    #[test]
    fn remote_ids_are_transparent_strings() {
        let tag = TaskTag::from("1234");
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"1234\"");
        let node: NodeUuid = serde_json::from_str("\"n1\"").unwrap();
        assert_eq!(node.as_str(), "n1");
        assert_eq!(node.to_string(), "n1");
    }

    #[test]
    fn empty_task_tag() {
        assert!(TaskTag::new("").is_empty());
        assert!(!TaskTag::new("7").is_empty());
    }

    #[test]
    fn node_uuid_ordering_is_lexical() {
        let mut nodes = vec![NodeUuid::from("n3"), NodeUuid::from("n1")];
        nodes.sort();
        assert_eq!(nodes[0].as_str(), "n1");
    }
}
