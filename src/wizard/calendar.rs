use chrono::{Datelike, Months, NaiveDate};

/// One month of the date picker, laid out Sunday-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    first: NaiveDate,
}

impl MonthGrid {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// e.g. "June 2025"
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    pub fn days_in_month(&self) -> u32 {
        self.next_month()
            .first
            .signed_duration_since(self.first)
            .num_days() as u32
    }

    /// Blank cells up to the weekday of the 1st, then every day.
    pub fn cells(&self) -> Vec<Option<NaiveDate>> {
        let leading = self.first.weekday().num_days_from_sunday() as usize;
        std::iter::repeat(None)
            .take(leading)
            .chain(
                (1..=self.days_in_month())
                    .map(|day| NaiveDate::from_ymd_opt(self.year(), self.month(), day)),
            )
            .collect()
    }

    pub fn next_month(&self) -> Self {
        Self {
            first: self
                .first
                .checked_add_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    pub fn prev_month(&self) -> Self {
        Self {
            first: self
                .first
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }
}

/// Today and earlier are never offered.
pub fn is_bookable(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}
