//! Read-only aggregates over one import.

pub mod birthdays;
pub mod percentile;

pub use birthdays::{BirthdayReport, Presents, relatives_birthdays};
pub use percentile::{TownAgeStats, percentile, town_age_percentiles};
