//! Per-month present counts.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{Citizen, CitizenId};

/// How many presents a citizen buys in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presents {
    pub citizen_id: CitizenId,
    pub presents: u32,
}

/// Month number (1 to 12) to the citizens buying presents that month.
pub type BirthdayReport = BTreeMap<u32, Vec<Presents>>;

/// Count, for every citizen and month, the relatives born in that month.
///
/// Every month key is present. Only non-zero counts are listed and citizens
/// appear in ascending id order. A self-relation counts the citizen's own
/// birthday.
pub fn relatives_birthdays(citizens: &[Citizen]) -> BirthdayReport {
    let birth_months: HashMap<CitizenId, u32> = citizens
        .iter()
        .map(|c| (c.citizen_id, c.birth_date.month()))
        .collect();

    let mut report: BirthdayReport = (1..=12).map(|month| (month, Vec::new())).collect();

    let mut ordered: Vec<&Citizen> = citizens.iter().collect();
    ordered.sort_by_key(|c| c.citizen_id);

    for citizen in ordered {
        let mut per_month = [0u32; 12];
        for month in citizen.relatives.iter().filter_map(|id| birth_months.get(id)) {
            per_month[(*month - 1) as usize] += 1;
        }

        for (idx, presents) in per_month.iter().enumerate() {
            if *presents > 0
                && let Some(entries) = report.get_mut(&(idx as u32 + 1))
            {
                entries.push(Presents {
                    citizen_id: citizen.citizen_id,
                    presents: *presents,
                });
            }
        }
    }

    report
}
