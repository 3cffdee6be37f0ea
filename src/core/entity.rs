//! Entity trait and shared value types

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::EntityId;

/// Common trait for all stored entities
pub trait Entity: Serialize + DeserializeOwned {
    /// The entity type prefix (e.g., "SHG", "MEM")
    const PREFIX: &'static str;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Short display label (name, or a description for survey rows)
    fn label(&self) -> String;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;
}

/// Declares a closed set of lowercase text codes.
///
/// Generates the enum with serde names, `as_str`, `ALL`, `Display`, `FromStr`
/// and the rusqlite conversions so the codes can be bound and read directly.
#[macro_export]
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let valid: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("Invalid {}: {}. Use {}", $label, s, valid.join(", "))
                    })
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
            }
        }
    };
}

text_enum! {
    /// Lifecycle status shared by clusters, groups and members
    #[derive(Default)]
    pub enum Status as "status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
    }
}

text_enum! {
    pub enum Gender as "gender" {
        Male => "male",
        Female => "female",
    }
}

text_enum! {
    pub enum MaritalStatus as "marital status" {
        Single => "single",
        Married => "married",
        Divorced => "divorced",
        Widowed => "widowed",
    }
}

/// Current time truncated to whole seconds, the precision stored on disk
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Canonical on-disk timestamp form; sorts lexicographically in time order
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a stored timestamp, falling back to the epoch on corrupt values
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
        .unwrap_or_default()
}
