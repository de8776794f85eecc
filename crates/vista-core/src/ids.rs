//! Strongly-typed identifiers for BI-service resources.
//!
//! Workspaces, reports and datasets are all GUIDs on the wire. The nil GUID
//! is never a real resource; boundaries normalize it to `None` through
//! [`Identifier::non_nil`] or the [`blank_as_none`] serde helper.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Behaviour shared by every resource identifier.
pub trait Identifier: Copy + FromStr + fmt::Display {
    fn as_uuid(&self) -> &Uuid;

    /// `true` for the all-zero GUID.
    fn is_nil(&self) -> bool {
        self.as_uuid().is_nil()
    }

    /// Returns `None` for the all-zero GUID.
    fn non_nil(self) -> Option<Self> {
        if self.is_nil() { None } else { Some(self) }
    }
}

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Identifier for $name {
            fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

define_id!(WorkspaceId);
define_id!(ReportId);
define_id!(DatasetId);

/// Serde helper for optional identifiers.
///
/// `null`, a missing field, `""` and the nil GUID all read as `None`.
/// Use with `#[serde(default, deserialize_with = "blank_as_none::deserialize")]`.
pub mod blank_as_none {
    use super::Identifier;
    use serde::{Deserialize, Deserializer, de};
    use std::fmt::Display;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Identifier,
        <T as std::str::FromStr>::Err: Display,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse::<T>()
                .map(Identifier::non_nil)
                .map_err(de::Error::custom),
        }
    }
}

/// Drops nil identifiers and duplicates, keeping first-seen order.
pub fn dedup_non_nil<T, I>(ids: I) -> Vec<T>
where
    T: Identifier + PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut out: Vec<T> = Vec::new();
    for id in ids.into_iter().filter_map(Identifier::non_nil) {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
