//! Data Transfer Objects for the API
//!
//! Request types carry the wire shape of a citizen and check every field
//! before anything reaches the registry. Response types wrap their payload in
//! a `data` envelope.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use utoipa::ToSchema;

use citizens::models::{
    BIRTH_DATE_FORMAT, Citizen, CitizenId, CitizenRecord, CitizenUpdate, FieldPatch, Gender,
    ImportId,
};
use citizens::reports::{BirthdayReport, Presents, TownAgeStats};

use crate::error::{ServerResult, bad_request, validation_error};

/// Longest accepted value of a text field, in characters
pub const MAX_TEXT_LENGTH: usize = 256;

/// Body of `POST /imports`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImportRequest {
    /// Citizens of the new import
    pub citizens: Vec<CitizenInput>,
}

impl ImportRequest {
    /// Check every citizen and convert to registry records
    pub fn into_records(self, today: NaiveDate) -> ServerResult<Vec<CitizenRecord>> {
        self.citizens
            .into_iter()
            .map(|citizen| citizen.into_record(today))
            .collect()
    }
}

/// One citizen of an import
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CitizenInput {
    /// Positive id, unique within the import
    #[schema(example = 1, minimum = 1)]
    pub citizen_id: CitizenId,

    #[schema(example = "Moscow")]
    pub town: String,

    #[schema(example = "Lva Tolstogo")]
    pub street: String,

    #[schema(example = "16k7str5")]
    pub building: String,

    #[serde(rename = "appartement")]
    #[schema(example = 7)]
    pub apartment: u64,

    #[schema(example = "Ivanov Ivan Ivanovich")]
    pub name: String,

    /// Date of birth as `dd.mm.yyyy`
    #[schema(example = "26.12.1986")]
    pub birth_date: String,

    /// `male` or `female`
    #[schema(example = "male")]
    pub gender: String,

    /// Ids of relatives within the same import
    #[schema(example = json!([2, 3]))]
    pub relatives: Vec<CitizenId>,
}

impl CitizenInput {
    pub fn into_record(self, today: NaiveDate) -> ServerResult<CitizenRecord> {
        if self.citizen_id == 0 {
            return Err(validation_error("citizen_id must be positive integer"));
        }

        Ok(CitizenRecord {
            citizen_id: self.citizen_id,
            town: check_text("town", self.town)?,
            street: check_text("street", self.street)?,
            building: check_text("building", self.building)?,
            apartment: self.apartment,
            name: check_text("name", self.name)?,
            birth_date: parse_birth_date(&self.birth_date, today)?,
            gender: parse_gender(&self.gender)?,
            relatives: self.relatives,
        })
    }
}

/// Body of `PATCH /imports/{import_id}/citizens/{citizen_id}`
///
/// Every key is optional but none may be `null`; `relatives`, when present,
/// replaces the whole relative list.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PatchCitizenRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Kazan")]
    pub town: FieldPatch<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub street: FieldPatch<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub building: FieldPatch<String>,

    #[serde(default, rename = "appartement")]
    #[schema(value_type = Option<u64>)]
    pub apartment: FieldPatch<u64>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: FieldPatch<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>, example = "26.12.1986")]
    pub birth_date: FieldPatch<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>, example = "female")]
    pub gender: FieldPatch<String>,

    #[serde(default)]
    #[schema(value_type = Option<Vec<u64>>)]
    pub relatives: FieldPatch<Vec<CitizenId>>,
}

impl PatchCitizenRequest {
    /// Decode a raw body, rejecting an attempt to change the citizen id
    pub fn from_value(body: serde_json::Value) -> ServerResult<Self> {
        let serde_json::Value::Object(fields) = &body else {
            return Err(bad_request("Request body must be a JSON object"));
        };
        if fields.contains_key("citizen_id") {
            return Err(validation_error("citizen_id must not be specified"));
        }

        serde_json::from_value(body).map_err(|e| bad_request(format!("Invalid request body: {}", e)))
    }

    /// Check present fields and split into scalar update and new relatives
    pub fn into_update(
        self,
        today: NaiveDate,
    ) -> ServerResult<(CitizenUpdate, Option<Vec<CitizenId>>)> {
        let any_present = self.town.is_present()
            || self.street.is_present()
            || self.building.is_present()
            || self.apartment.is_present()
            || self.name.is_present()
            || self.birth_date.is_present()
            || self.gender.is_present()
            || self.relatives.is_present();
        if !any_present {
            return Err(validation_error(
                "No one field is provided. Must be at least one",
            ));
        }

        let update = CitizenUpdate {
            town: present("town", self.town)?
                .map(|v| check_text("town", v))
                .transpose()?,
            street: present("street", self.street)?
                .map(|v| check_text("street", v))
                .transpose()?,
            building: present("building", self.building)?
                .map(|v| check_text("building", v))
                .transpose()?,
            apartment: present("appartement", self.apartment)?,
            name: present("name", self.name)?
                .map(|v| check_text("name", v))
                .transpose()?,
            birth_date: present("birth_date", self.birth_date)?
                .map(|v| parse_birth_date(&v, today))
                .transpose()?,
            gender: present("gender", self.gender)?
                .map(|v| parse_gender(&v))
                .transpose()?,
        };

        let relatives = present("relatives", self.relatives)?;
        if let Some(relatives) = &relatives {
            check_unique(relatives)?;
        }

        Ok((update, relatives))
    }
}

fn present<T>(field: &str, patch: FieldPatch<T>) -> ServerResult<Option<T>> {
    patch
        .into_option()
        .map_err(|_| validation_error(format!("{} not specified", field)))
}

fn check_text(field: &str, value: String) -> ServerResult<String> {
    if value.trim().is_empty() {
        return Err(validation_error(format!("{} not specified", field)));
    }
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(validation_error(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(value)
}

fn parse_birth_date(value: &str, today: NaiveDate) -> ServerResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT).map_err(|_| {
        validation_error(format!("{} invalid format. Must be 'dd.mm.yyyy'", value))
    })?;
    if date >= today {
        return Err(validation_error(format!("Future '{}' date given", value)));
    }
    Ok(date)
}

fn parse_gender(value: &str) -> ServerResult<Gender> {
    value.parse().map_err(validation_error)
}

fn check_unique(relatives: &[CitizenId]) -> ServerResult<()> {
    let mut seen = HashSet::with_capacity(relatives.len());
    if relatives.iter().all(|id| seen.insert(*id)) {
        Ok(())
    } else {
        Err(validation_error("duplicate relatives ids given"))
    }
}

/// Citizen DTO for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CitizenDto {
    pub citizen_id: CitizenId,
    pub town: String,
    pub street: String,
    pub building: String,
    #[serde(rename = "appartement")]
    pub apartment: u64,
    pub name: String,
    /// Date of birth as `dd.mm.yyyy`
    #[schema(example = "26.12.1986")]
    pub birth_date: String,
    #[schema(example = "male")]
    pub gender: String,
    /// Relative ids in ascending order
    pub relatives: Vec<CitizenId>,
}

impl From<Citizen> for CitizenDto {
    fn from(citizen: Citizen) -> Self {
        Self {
            citizen_id: citizen.citizen_id,
            town: citizen.town,
            street: citizen.street,
            building: citizen.building,
            apartment: citizen.apartment,
            name: citizen.name,
            birth_date: citizen.birth_date.format(BIRTH_DATE_FORMAT).to_string(),
            gender: citizen.gender.to_string(),
            relatives: citizen.relatives.into_iter().collect(),
        }
    }
}

/// Id of a freshly stored import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportCreated {
    pub import_id: ImportId,
}

/// Presents one citizen buys in a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PresentsDto {
    pub citizen_id: CitizenId,
    pub presents: u32,
}

impl From<Presents> for PresentsDto {
    fn from(presents: Presents) -> Self {
        Self {
            citizen_id: presents.citizen_id,
            presents: presents.presents,
        }
    }
}

/// Age percentiles of one town
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TownAgeStatsDto {
    pub town: String,
    pub p50: f64,
    pub p75: f64,
    pub p99: f64,
}

impl From<TownAgeStats> for TownAgeStatsDto {
    fn from(stats: TownAgeStats) -> Self {
        Self {
            town: stats.town,
            p50: stats.p50,
            p75: stats.p75,
            p99: stats.p99,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportCreatedResponse {
    pub data: ImportCreated,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CitizenResponse {
    pub data: CitizenDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CitizenListResponse {
    pub data: Vec<CitizenDto>,
}

/// Month number (`"1"` to `"12"`) to presents per citizen
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BirthdaysResponse {
    pub data: BTreeMap<u32, Vec<PresentsDto>>,
}

impl From<BirthdayReport> for BirthdaysResponse {
    fn from(report: BirthdayReport) -> Self {
        let data = report
            .into_iter()
            .map(|(month, presents)| {
                (month, presents.into_iter().map(PresentsDto::from).collect())
            })
            .collect();
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PercentileResponse {
    pub data: Vec<TownAgeStatsDto>,
}
