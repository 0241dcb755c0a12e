//! Planning horizon: six consecutive calendar months, four sub-periods each.
//!
//! The horizon is always passed in explicitly. Nothing here reads the wall
//! clock except `SystemClock`, which only the CLI is expected to construct.

use core::fmt;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entities::Attribution;
use crate::errors::CoreError;

pub const PERIOD_COUNT: usize = 6;
pub const SUB_PERIOD_COUNT: usize = 4;

/* -------------------------------------------------------------------------- */
/*                                  Indices                                   */
/* -------------------------------------------------------------------------- */

/// Period 0..=5 within the horizon. Ordering is significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PeriodIndex(u8);

impl PeriodIndex {
    pub const FIRST: PeriodIndex = PeriodIndex(0);
    pub const LAST: PeriodIndex = PeriodIndex(PERIOD_COUNT as u8 - 1);

    pub fn new(i: u8) -> Result<Self, CoreError> {
        if (i as usize) < PERIOD_COUNT {
            Ok(Self(i))
        } else {
            Err(CoreError::PeriodOutOfRange(i))
        }
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Following period, `None` after the last one.
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1).ok()
    }

    /// Periods from this one to the end of the horizon, inclusive.
    #[inline]
    pub fn remaining(self) -> u64 {
        (PERIOD_COUNT - self.as_usize()) as u64
    }

    /// All periods in increasing order.
    pub fn all() -> impl Iterator<Item = PeriodIndex> {
        (0..PERIOD_COUNT as u8).map(PeriodIndex)
    }
}

impl TryFrom<u8> for PeriodIndex {
    type Error = CoreError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<PeriodIndex> for u8 {
    fn from(p: PeriodIndex) -> u8 {
        p.0
    }
}

/// One-based label, `P1`..`P6`, as printed in reports.
impl fmt::Display for PeriodIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

/// Sub-period 1..=4 within a period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SubPeriodIndex(u8);

impl SubPeriodIndex {
    pub fn new(i: u8) -> Result<Self, CoreError> {
        if (1..=SUB_PERIOD_COUNT as u8).contains(&i) {
            Ok(Self(i))
        } else {
            Err(CoreError::SubPeriodOutOfRange(i))
        }
    }

    /// `ceil(day / 7)`, with days 29..=31 folded into sub-period 4.
    pub fn from_day_of_month(day: u32) -> Self {
        let week = (day + 6) / 7;
        Self(week.clamp(1, SUB_PERIOD_COUNT as u32) as u8)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based slot for array indexing.
    #[inline]
    pub fn slot(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = SubPeriodIndex> {
        (1..=SUB_PERIOD_COUNT as u8).map(SubPeriodIndex)
    }
}

impl TryFrom<u8> for SubPeriodIndex {
    type Error = CoreError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<SubPeriodIndex> for u8 {
    fn from(s: SubPeriodIndex) -> u8 {
        s.0
    }
}

/* -------------------------------------------------------------------------- */
/*                                  Horizon                                   */
/* -------------------------------------------------------------------------- */

/// Six consecutive months starting on the first day of `start`'s month.
/// `bounds[i]` is the first day of period `i`; `bounds[6]` is the exclusive end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Horizon {
    bounds: [NaiveDate; PERIOD_COUNT + 1],
}

impl Horizon {
    /// Horizon beginning at `start`, which must be the first of a month.
    pub fn starting_at(start: NaiveDate) -> Result<Self, CoreError> {
        if start.day() != 1 {
            return Err(CoreError::HorizonNotMonthStart(start));
        }
        let mut bounds = [start; PERIOD_COUNT + 1];
        for (i, slot) in bounds.iter_mut().enumerate().skip(1) {
            *slot = start
                .checked_add_months(Months::new(i as u32))
                .ok_or(CoreError::DateOverflow)?;
        }
        Ok(Self { bounds })
    }

    /// Half-year horizon containing `reference`: 1 January for January–June,
    /// 1 July for July–December.
    pub fn containing(reference: NaiveDate) -> Result<Self, CoreError> {
        let month = if reference.month() <= 6 { 1 } else { 7 };
        let start =
            NaiveDate::from_ymd_opt(reference.year(), month, 1).ok_or(CoreError::DateOverflow)?;
        Self::starting_at(start)
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.bounds[0]
    }

    /// Exclusive end (first day after the last period).
    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.bounds[PERIOD_COUNT]
    }

    #[inline]
    pub fn period_start(&self, p: PeriodIndex) -> NaiveDate {
        self.bounds[p.as_usize()]
    }

    #[inline]
    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start() && d < self.end()
    }

    /// Period whose month contains `d`.
    pub fn period_of(&self, d: NaiveDate) -> Option<PeriodIndex> {
        if !self.contains(d) {
            return None;
        }
        let start = self.start();
        let months = (d.year() - start.year()) * 12 + d.month() as i32 - start.month() as i32;
        u8::try_from(months).ok().and_then(|m| PeriodIndex::new(m).ok())
    }

    /// Map a timestamp to its period and sub-period; `None` outside the horizon.
    pub fn locate(&self, ts: NaiveDateTime) -> Option<Attribution> {
        let d = ts.date();
        let period = self.period_of(d)?;
        Some(Attribution {
            period,
            sub_period: SubPeriodIndex::from_day_of_month(d.day()),
        })
    }

    /// The period in progress on `reference`, if it lies inside the horizon.
    #[inline]
    pub fn current_period(&self, reference: NaiveDate) -> Option<PeriodIndex> {
        self.period_of(reference)
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Clock                                    */
/* -------------------------------------------------------------------------- */

/// Source of the reference date. Injected so reports stay reproducible.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Local wall-clock date.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/* ---------------------------------- Tests --------------------------------- */
