//! A calendar month in the "YYYY-MM" format used by budgets.

use std::fmt::Display;

use time::{Date, Month, PrimitiveDateTime, Time};

use crate::Error;

/// A calendar month, e.g. "2025-03".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BudgetMonth {
    first_day: Date,
}

impl BudgetMonth {
    /// Parse a month in the format "YYYY-MM".
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `text` is not a four digit year and a
    /// two digit month separated by a hyphen.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidMonth(text.to_owned());

        let (year, month) = text.trim().split_once('-').ok_or_else(invalid)?;

        let is_digits = |part: &str, len: usize| {
            part.len() == len && part.chars().all(|c| c.is_ascii_digit())
        };
        if !is_digits(year, 4) || !is_digits(month, 2) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let first_day = Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;

        Ok(Self { first_day })
    }

    /// The month containing `date_time`.
    pub fn containing(date_time: PrimitiveDateTime) -> Self {
        let date = date_time.date();

        Self {
            // Day 1 exists in every month.
            first_day: date.replace_day(1).unwrap_or(date),
        }
    }

    /// Midnight on the first day of the month.
    pub fn start(&self) -> PrimitiveDateTime {
        self.first_day.with_time(Time::MIDNIGHT)
    }

    /// Midnight on the first day of the following month.
    pub fn end(&self) -> PrimitiveDateTime {
        let next_month = self.first_day.month().next();
        let year = if next_month == Month::January {
            self.first_day.year() + 1
        } else {
            self.first_day.year()
        };

        Date::from_calendar_date(year, next_month, 1)
            .unwrap_or(Date::MAX)
            .with_time(Time::MIDNIGHT)
    }
}

impl Display for BudgetMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}",
            self.first_day.year(),
            u8::from(self.first_day.month())
        )
    }
}
