//! First-occurrence-per-unit attribution of service events.
//!
//! Contract:
//! - Events are ordered by (timestamp, unit id, input position) first, so the
//!   "first occurrence" is well defined even for unordered input.
//! - A unit is attributed to exactly one (period, sub-period), globally across
//!   the horizon. Later events for the same unit are absorbed and counted.
//! - Events of another category (when a category filter is set) and events
//!   outside the horizon never attribute a unit; they are counted separately.
//!
//! The accumulator is a `BTreeMap` keyed by unit id, so iteration and memory
//! are bounded by the number of distinct units.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use pmq_core::entities::{Attribution, EventRecord};
use pmq_core::horizon::{Horizon, PeriodIndex, PERIOD_COUNT, SUB_PERIOD_COUNT};
use pmq_core::ids::UnitId;

/// Outcome of deduplicating one event batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dedup {
    pub attributions: BTreeMap<UnitId, Attribution>,
    /// Events absorbed because their unit was already attributed.
    pub duplicates: u64,
    pub outside_horizon: u64,
    pub filtered_category: u64,
}

/// Deduplicated actual counts per period and per sub-period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actuals {
    pub periods: [u64; PERIOD_COUNT],
    pub sub_periods: [[u64; SUB_PERIOD_COUNT]; PERIOD_COUNT],
}

impl Actuals {
    #[inline]
    pub fn period(&self, p: PeriodIndex) -> u64 {
        self.periods[p.as_usize()]
    }

    #[inline]
    pub fn sub_periods_of(&self, p: PeriodIndex) -> [u64; SUB_PERIOD_COUNT] {
        self.sub_periods[p.as_usize()]
    }
}

impl Dedup {
    /// Count attributed units per period and sub-period.
    pub fn actuals(&self) -> Actuals {
        let mut out = Actuals::default();
        for a in self.attributions.values() {
            out.periods[a.period.as_usize()] += 1;
            out.sub_periods[a.period.as_usize()][a.sub_period.slot()] += 1;
        }
        out
    }

    #[inline]
    pub fn attributed(&self) -> usize {
        self.attributions.len()
    }
}

/// Attribute each unit to the period/sub-period of its first in-horizon event.
pub fn deduplicate(events: &[EventRecord], horizon: &Horizon, category: Option<&str>) -> Dedup {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        let (ea, eb) = (&events[a], &events[b]);
        (ea.timestamp, &ea.unit_id, a).cmp(&(eb.timestamp, &eb.unit_id, b))
    });

    let mut out = Dedup::default();
    for idx in order {
        let ev = &events[idx];

        if let Some(want) = category {
            if ev.category != want {
                out.filtered_category += 1;
                continue;
            }
        }

        let Some(at) = horizon.locate(ev.timestamp) else {
            out.outside_horizon += 1;
            continue;
        };

        match out.attributions.entry(ev.unit_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(at);
            }
            Entry::Occupied(_) => out.duplicates += 1,
        }
    }
    out
}

/* ---------------------------------- Tests --------------------------------- */
