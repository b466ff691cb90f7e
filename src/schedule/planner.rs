use crate::config::ScheduleConfig;
use crate::error::Result;
use crate::schedule::interval::{Interval, IntervalField};
use itertools::{iproduct, Itertools};
use std::path::Path;

/// Enumerates intervals as the cartesian product of the configured candidate
/// sets: years outermost, minutes innermost, each set in configured order.
#[derive(Debug, Clone)]
pub struct IntervalPlanner {
    years: Vec<u32>,
    months: Vec<u32>,
    days: Vec<u32>,
    hours: Vec<u32>,
    minutes: Vec<u32>,
}

impl IntervalPlanner {
    pub fn new(schedule: &ScheduleConfig) -> Result<Self> {
        Ok(Self {
            years: checked_set(IntervalField::Year, &schedule.years)?,
            months: checked_set(IntervalField::Month, &schedule.months)?,
            days: checked_set(IntervalField::Day, &schedule.days)?,
            hours: checked_set(IntervalField::Hour, &schedule.hours)?,
            minutes: checked_set(IntervalField::Minute, &schedule.minutes)?,
        })
    }

    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        iproduct!(
            self.years.iter(),
            self.months.iter(),
            self.days.iter(),
            self.hours.iter(),
            self.minutes.iter()
        )
        .map(|(&year, &month, &day, &hour, &minute)| Interval {
            year,
            month,
            day,
            hour,
            minute,
        })
    }

    pub fn len(&self) -> usize {
        self.years.len() * self.months.len() * self.days.len() * self.hours.len() * self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split the plan into intervals whose output already exists and those still pending.
    pub fn partition_completed(&self, out_dir: &Path) -> (Vec<Interval>, Vec<Interval>) {
        self.intervals()
            .partition(|interval| out_dir.join(interval.output_file_name()).exists())
    }
}

// Duplicates collapse to their first occurrence so an interval is planned once.
fn checked_set(field: IntervalField, values: &[u32]) -> Result<Vec<u32>> {
    values
        .iter()
        .unique()
        .map(|&value| field.check(value))
        .collect()
}
