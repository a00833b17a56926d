//! Data models for imports and citizens

pub mod citizen;

pub use citizen::{
    BIRTH_DATE_FORMAT, Citizen, CitizenId, CitizenRecord, CitizenUpdate, EdgeMap, FieldPatch,
    Gender, ImportId,
};
