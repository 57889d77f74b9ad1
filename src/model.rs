//! Entities and the plain records the API hands to the services.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type CatId = i64;
pub type MissionId = i64;
pub type TargetId = i64;

/// Non-negative money amount with two fractional digits, stored as cents.
///
/// At most 10 significant digits (8 before the point), matching a
/// `DECIMAL(10, 2)` column. Serialized as a string like `"1234.50"`;
/// accepted as a string or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Salary(i64);

const MAX_WHOLE_DIGITS: usize = 8;

impl Salary {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Salary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err("salary must not be negative".to_string());
        }
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err("salary is empty".to_string());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(format!("invalid salary: {s}"));
        }
        if frac.len() > 2 {
            return Err("salary allows at most 2 decimal places".to_string());
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > MAX_WHOLE_DIGITS {
            return Err("salary allows at most 10 digits".to_string());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| format!("invalid salary: {s}"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| format!("invalid salary: {s}"))? * 10,
            _ => frac.parse().map_err(|_| format!("invalid salary: {s}"))?,
        };
        Ok(Self(whole * 100 + frac))
    }
}

impl Serialize for Salary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Salary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SalaryVisitor;

        impl Visitor<'_> for SalaryVisitor {
            type Value = Salary;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal with at most 2 decimal places")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Salary, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Salary, E> {
                v.to_string().parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Salary, E> {
                v.to_string().parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Salary, E> {
                if !v.is_finite() {
                    return Err(E::custom("salary must be a finite number"));
                }
                v.to_string().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SalaryVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub years_experience: u32,
    pub breed: String,
    pub salary: Salary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a cat creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCat {
    pub name: String,
    #[serde(default)]
    pub years_experience: u32,
    pub breed: String,
    pub salary: Salary,
}

/// Partial cat update. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub salary: Option<Salary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub cat: Option<CatId>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    #[serde(skip)]
    pub mission_id: MissionId,
    pub name: String,
    pub country: String,
    pub notes: String,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item of a mission's target list, as sent by the client.
///
/// `id` is only meaningful on update, where it selects the existing target
/// to overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetInput {
    #[serde(default)]
    pub id: Option<TargetId>,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub complete: Option<bool>,
}

impl TargetInput {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: TargetId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = Some(complete);
        self
    }
}

/// Body of a mission creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMission {
    #[serde(default)]
    pub cat: Option<CatId>,
    #[serde(default)]
    pub completed: Option<bool>,
    pub targets: Vec<TargetInput>,
}

/// Partial mission update. Each present field triggers one update step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionPatch {
    #[serde(default)]
    pub cat: Option<CatId>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub targets: Option<Vec<TargetInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignCat {
    #[serde(alias = "catId")]
    pub cat_id: CatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesUpdate {
    pub notes: String,
}

/// A mission together with its targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionView {
    pub id: MissionId,
    pub cat: Option<CatId>,
    pub completed: bool,
    pub targets: Vec<Target>,
    pub created_at: DateTime<Utc>,
}

impl MissionView {
    pub fn new(mission: Mission, targets: Vec<Target>) -> Self {
        Self {
            id: mission.id,
            cat: mission.cat,
            completed: mission.completed,
            targets,
            created_at: mission.created_at,
        }
    }
}
