use crate::error::{NewsCrawlError, Result};
use std::fmt;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl IntervalField {
    pub fn name(&self) -> &'static str {
        match self {
            IntervalField::Year => "year",
            IntervalField::Month => "month",
            IntervalField::Day => "day",
            IntervalField::Hour => "hour",
            IntervalField::Minute => "minute",
        }
    }

    /// Accepted values. The year range keeps the rendered width at four digits.
    pub fn range(&self) -> RangeInclusive<u32> {
        match self {
            IntervalField::Year => 1000..=9999,
            IntervalField::Month => 1..=12,
            IntervalField::Day => 1..=31,
            IntervalField::Hour => 0..=23,
            IntervalField::Minute => 0..=59,
        }
    }

    pub fn check(&self, value: u32) -> Result<u32> {
        if self.range().contains(&value) {
            Ok(value)
        } else {
            Err(NewsCrawlError::InvalidInterval {
                field: self.name(),
                value,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub(super) year: u32,
    pub(super) month: u32,
    pub(super) day: u32,
    pub(super) hour: u32,
    pub(super) minute: u32,
}

impl Interval {
    pub fn new(year: u32, month: u32, day: u32, hour: u32, minute: u32) -> Result<Self> {
        Ok(Self {
            year: IntervalField::Year.check(year)?,
            month: IntervalField::Month.check(month)?,
            day: IntervalField::Day.check(day)?,
            hour: IntervalField::Hour.check(hour)?,
            minute: IntervalField::Minute.check(minute)?,
        })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Canonical `YYYYMMDDHHMM00` form; seconds are always `00`.
    pub fn timestamp(&self) -> String {
        format!(
            "{:04}{:02}{:02}{:02}{:02}00",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }

    pub fn output_file_name(&self) -> String {
        format!("{}.csv", self.timestamp())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_zero_padded() {
        let interval = Interval::new(2021, 3, 5, 7, 9).unwrap();
        assert_eq!(interval.timestamp(), "20210305070900");
        assert_eq!(interval.timestamp().len(), 14);
        assert_eq!(interval.to_string(), "20210305070900");
    }

    #[test]
    fn test_output_file_name() {
        let interval = Interval::new(2020, 12, 31, 23, 45).unwrap();
        assert_eq!(interval.output_file_name(), "20201231234500.csv");
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        assert!(Interval::new(999, 1, 1, 0, 0).is_err());
        assert!(Interval::new(2021, 0, 1, 0, 0).is_err());
        assert!(Interval::new(2021, 1, 32, 0, 0).is_err());
        assert!(Interval::new(2021, 1, 1, 24, 0).is_err());

        match Interval::new(2021, 1, 1, 0, 60) {
            Err(NewsCrawlError::InvalidInterval { field, value }) => {
                assert_eq!(field, "minute");
                assert_eq!(value, 60);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
