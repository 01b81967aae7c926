//! crates/outbreak_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Days since the Unix epoch (UTC).
pub type DayIndex = i64;

const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Computes the day bucket a timestamp falls into.
pub fn day_index(at: DateTime<Utc>) -> DayIndex {
    at.timestamp_millis().div_euclid(MILLIS_PER_DAY)
}

//=========================================================================================
// Symptoms
//=========================================================================================

/// The fixed set of symptoms a report may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Symptom {
    Fever,
    Fatigue,
    Cough,
    ShortnessOfBreath,
    SoreThroat,
    RunnyNose,
    BodyAches,
    Headache,
    Chills,
    Nausea,
    Diarrhea,
    LossOfAppetite,
    Sweating,
    JointPain,
    SwollenLymphNodes,
    Rash,
    AbdominalPain,
    Dizziness,
    LossOfTasteOrSmell,
    ChestPain,
}

impl Symptom {
    pub const COUNT: usize = 20;

    /// Every symptom, in the order they are stored and reported.
    pub const ALL: [Symptom; Symptom::COUNT] = [
        Symptom::Fever,
        Symptom::Fatigue,
        Symptom::Cough,
        Symptom::ShortnessOfBreath,
        Symptom::SoreThroat,
        Symptom::RunnyNose,
        Symptom::BodyAches,
        Symptom::Headache,
        Symptom::Chills,
        Symptom::Nausea,
        Symptom::Diarrhea,
        Symptom::LossOfAppetite,
        Symptom::Sweating,
        Symptom::JointPain,
        Symptom::SwollenLymphNodes,
        Symptom::Rash,
        Symptom::AbdominalPain,
        Symptom::Dizziness,
        Symptom::LossOfTasteOrSmell,
        Symptom::ChestPain,
    ];

    /// The wire name of the symptom, as used in JSON bodies and documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Symptom::Fever => "fever",
            Symptom::Fatigue => "fatigue",
            Symptom::Cough => "cough",
            Symptom::ShortnessOfBreath => "shortnessOfBreath",
            Symptom::SoreThroat => "soreThroat",
            Symptom::RunnyNose => "runnyNose",
            Symptom::BodyAches => "bodyAches",
            Symptom::Headache => "headache",
            Symptom::Chills => "chills",
            Symptom::Nausea => "nausea",
            Symptom::Diarrhea => "diarrhea",
            Symptom::LossOfAppetite => "lossOfAppetite",
            Symptom::Sweating => "sweating",
            Symptom::JointPain => "jointPain",
            Symptom::SwollenLymphNodes => "swollenLymphNodes",
            Symptom::Rash => "rash",
            Symptom::AbdominalPain => "abdominalPain",
            Symptom::Dizziness => "dizziness",
            Symptom::LossOfTasteOrSmell => "lossOfTasteOrSmell",
            Symptom::ChestPain => "chestPain",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown symptom: {0}")]
pub struct UnknownSymptom(pub String);

impl FromStr for Symptom {
    type Err = UnknownSymptom;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symptom::ALL
            .into_iter()
            .find(|symptom| symptom.as_str() == s)
            .ok_or_else(|| UnknownSymptom(s.to_string()))
    }
}

//=========================================================================================
// Symptom Counts
//=========================================================================================

/// One counter per symptom. Always fully populated: a symptom nobody reported is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<Symptom, u64>")]
pub struct SymptomCounts {
    counts: [u64; Symptom::COUNT],
}

impl SymptomCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symptom: Symptom) -> u64 {
        self.counts[symptom.slot()]
    }

    pub fn set(&mut self, symptom: Symptom, count: u64) {
        self.counts[symptom.slot()] = count;
    }

    /// Adds `other` into `self`, slot by slot. Counters saturate instead of wrapping.
    pub fn accumulate(&mut self, other: &SymptomCounts) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symptom, u64)> + '_ {
        Symptom::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// Builds counts from the loose key/value fields of an incoming report.
    ///
    /// Keys that are not known symptoms, and values that are not non-negative
    /// integers, are left out. Their keys are returned so the caller can log them.
    pub fn from_report(
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> (Self, Vec<String>) {
        let mut counts = Self::new();
        let mut ignored = Vec::new();

        for (key, value) in fields {
            match (key.parse::<Symptom>(), value.as_u64()) {
                (Ok(symptom), Some(count)) => counts.set(symptom, count),
                _ => ignored.push(key.clone()),
            }
        }

        (counts, ignored)
    }
}

impl From<BTreeMap<Symptom, u64>> for SymptomCounts {
    fn from(map: BTreeMap<Symptom, u64>) -> Self {
        let mut counts = Self::new();
        for (symptom, count) in map {
            counts.set(symptom, count);
        }
        counts
    }
}

impl Serialize for SymptomCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Symptom::COUNT))?;
        for (symptom, count) in self.iter() {
            map.serialize_entry(symptom.as_str(), &count)?;
        }
        map.end()
    }
}

//=========================================================================================
// ZIP Records
//=========================================================================================

/// One day's worth of symptom counts for a ZIP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: DayIndex,
    pub symptoms: SymptomCounts,
}

/// All symptom reports received for a ZIP code, bucketed by day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipRecord {
    pub zip: String,
    pub entries: Vec<DayEntry>,
    pub population: Option<i64>,
}

//=========================================================================================
// Users
//=========================================================================================

// Represents a registered user - safe to pass around
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}
