//! Citizen records and partial updates.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Identifier of an import, assigned by the store.
pub type ImportId = u64;

/// Identifier of a citizen, unique within one import.
pub type CitizenId = u64;

/// Symmetric adjacency of a batch: citizen id to the ids it is related to.
pub type EdgeMap = BTreeMap<CitizenId, BTreeSet<CitizenId>>;

/// Date format used on the wire for birth dates.
pub const BIRTH_DATE_FORMAT: &str = "%d.%m.%Y";

/// Citizen gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(format!(
                "Invalid gender - {}. Must be only 'male' or 'female'",
                s
            )),
        }
    }
}

/// A persisted citizen.
///
/// `relatives` holds the directed links stored on this citizen's side. The
/// registry keeps them symmetric: `b` is in `a.relatives` exactly when `a` is
/// in `b.relatives`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
    pub citizen_id: CitizenId,
    pub town: String,
    pub street: String,
    pub building: String,
    pub apartment: u64,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub relatives: BTreeSet<CitizenId>,
}

impl Citizen {
    /// Whole years of age on `today`, counting a birthday only once reached.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        use chrono::Datelike;

        let mut age = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age
    }
}

/// One element of an incoming batch, before graph validation.
///
/// `relatives` keeps the submitted order and any duplicates so that the
/// validator can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitizenRecord {
    pub citizen_id: CitizenId,
    pub town: String,
    pub street: String,
    pub building: String,
    pub apartment: u64,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub relatives: Vec<CitizenId>,
}

impl CitizenRecord {
    /// Build the stored citizen with the given (already validated) relatives.
    pub fn into_citizen(self, relatives: BTreeSet<CitizenId>) -> Citizen {
        Citizen {
            citizen_id: self.citizen_id,
            town: self.town,
            street: self.street,
            building: self.building,
            apartment: self.apartment,
            name: self.name,
            birth_date: self.birth_date,
            gender: self.gender,
            relatives,
        }
    }
}

/// Scalar part of a partial update. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitizenUpdate {
    pub town: Option<String>,
    pub street: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<u64>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

impl CitizenUpdate {
    /// True when no scalar attribute is touched.
    pub fn is_empty(&self) -> bool {
        self.town.is_none()
            && self.street.is_none()
            && self.building.is_none()
            && self.apartment.is_none()
            && self.name.is_none()
            && self.birth_date.is_none()
            && self.gender.is_none()
    }

    pub fn apply_to(&self, citizen: &mut Citizen) {
        if let Some(town) = &self.town {
            citizen.town = town.clone();
        }
        if let Some(street) = &self.street {
            citizen.street = street.clone();
        }
        if let Some(building) = &self.building {
            citizen.building = building.clone();
        }
        if let Some(apartment) = self.apartment {
            citizen.apartment = apartment;
        }
        if let Some(name) = &self.name {
            citizen.name = name.clone();
        }
        if let Some(birth_date) = self.birth_date {
            citizen.birth_date = birth_date;
        }
        if let Some(gender) = self.gender {
            citizen.gender = gender;
        }
    }
}

/// Presence of a field in a partial update document.
///
/// Distinguishes a key that was left out (`Absent`) from one explicitly set to
/// `null` (`Null`). Use with `#[serde(default)]` so that a missing key
/// deserializes to `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> FieldPatch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldPatch::Absent)
    }

    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Map to the value, turning an explicit `null` into `Err(())`.
    pub fn into_option(self) -> Result<Option<T>, ()> {
        match self {
            FieldPatch::Absent => Ok(None),
            FieldPatch::Null => Err(()),
            FieldPatch::Value(value) => Ok(Some(value)),
        }
    }
}

impl<'de, T> Deserialize<'de> for FieldPatch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => FieldPatch::Value(value),
            None => FieldPatch::Null,
        })
    }
}
