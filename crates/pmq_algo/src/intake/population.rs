//! Population sizing and the start-of-horizon roster.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;

use pmq_core::entities::{Population, UnitRecord};
use pmq_core::horizon::Horizon;
use pmq_core::ids::UnitId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PopulationError {
    #[error("cutoff {cutoff} is outside the horizon [{start}, {end}]")]
    InvalidCutoff {
        cutoff: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// A cutoff must lie in `[start, end]`; the exclusive end is allowed.
pub fn validate_cutoff(cutoff: NaiveDate, horizon: &Horizon) -> Result<(), PopulationError> {
    if cutoff < horizon.start() || cutoff > horizon.end() {
        return Err(PopulationError::InvalidCutoff {
            cutoff,
            start: horizon.start(),
            end: horizon.end(),
        });
    }
    Ok(())
}

/// Distinct units with an eligible record updated strictly before `cutoff`.
pub fn size_population(
    units: &[UnitRecord],
    cutoff: NaiveDate,
    horizon: &Horizon,
) -> Result<Population, PopulationError> {
    validate_cutoff(cutoff, horizon)?;

    let eligible: BTreeSet<&UnitId> = units
        .iter()
        .filter(|u| u.eligible && u.updated_at.date() < cutoff)
        .map(|u| &u.unit_id)
        .collect();

    Ok(Population {
        total: eligible.len() as u64,
        as_of: cutoff,
    })
}

/// Eligible units whose record was updated on the horizon start date, sorted.
pub fn baseline_roster(units: &[UnitRecord], horizon: &Horizon) -> Vec<UnitId> {
    let start = horizon.start();
    units
        .iter()
        .filter(|u| u.eligible && u.updated_at.date() == start)
        .map(|u| u.unit_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn unit(id: &str, eligible: bool, updated: NaiveDate) -> UnitRecord {
        UnitRecord {
            unit_id: id.parse().unwrap(),
            eligible,
            updated_at: updated.and_hms_opt(6, 0, 0).unwrap(),
        }
    }

    fn horizon() -> Horizon {
        Horizon::starting_at(d(2026, 7, 1)).unwrap()
    }

    #[test]
    fn counts_distinct_eligible_before_cutoff() {
        let units = vec![
            unit("A", true, d(2026, 7, 1)),
            unit("A", true, d(2026, 8, 1)),
            unit("B", false, d(2026, 7, 1)),
            unit("C", true, d(2026, 12, 31)),
            unit("D", true, d(2027, 1, 1)),
        ];
        let pop = size_population(&units, horizon().end(), &horizon()).unwrap();
        assert_eq!(pop.total, 2);
        assert_eq!(pop.as_of, d(2027, 1, 1));

        let pop = size_population(&units, d(2026, 8, 1), &horizon()).unwrap();
        assert_eq!(pop.total, 1);
    }

    #[test]
    fn cutoff_outside_horizon_fails_fast() {
        let err = size_population(&[], d(2026, 6, 30), &horizon()).unwrap_err();
        assert_eq!(
            err,
            PopulationError::InvalidCutoff {
                cutoff: d(2026, 6, 30),
                start: d(2026, 7, 1),
                end: d(2027, 1, 1),
            }
        );
        assert!(validate_cutoff(d(2027, 1, 2), &horizon()).is_err());
        assert!(validate_cutoff(d(2026, 7, 1), &horizon()).is_ok());
    }

    #[test]
    fn empty_roster_is_zero_population() {
        let pop = size_population(&[], horizon().end(), &horizon()).unwrap();
        assert_eq!(pop.total, 0);
    }

    #[test]
    fn baseline_roster_is_sorted_and_distinct() {
        let units = vec![
            unit("U9", true, d(2026, 7, 1)),
            unit("U1", true, d(2026, 7, 1)),
            unit("U1", true, d(2026, 7, 1)),
            unit("U5", false, d(2026, 7, 1)),
            unit("U3", true, d(2026, 7, 2)),
        ];
        let roster: Vec<String> = baseline_roster(&units, &horizon())
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(roster, vec!["U1", "U9"]);
    }
}
