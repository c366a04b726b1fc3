use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    Weekly,
    Monthly,
    Quarterly,
    Annually,
    AllTime,
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "Weekly"),
            Self::Monthly => write!(f, "Monthly"),
            Self::Quarterly => write!(f, "Quarterly"),
            Self::Annually => write!(f, "Yearly"),
            Self::AllTime => write!(f, "All time"),
        }
    }
}

impl FromStr for Increment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" | "week" | "w" => Ok(Self::Weekly),
            "monthly" | "month" | "m" => Ok(Self::Monthly),
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            "annually" | "yearly" | "year" | "y" => Ok(Self::Annually),
            "all" | "alltime" | "all-time" => Ok(Self::AllTime),
            other => Err(format!(
                "unknown increment {other:?} (expected weekly, monthly, quarterly, annually or all)"
            )),
        }
    }
}

impl Increment {
    /// First day of the bucket containing `date`. For example,
    /// `Monthly.first_day(2025-04-15)` is 2025-04-01 and
    /// `Annually.first_day(2025-04-15)` is 2025-01-01.
    pub fn first_day(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => first_day_of_iso_week(date),
            Self::Monthly => first_day_of_month(date),
            Self::Quarterly => first_day_of_quarter(date),
            Self::Annually | Self::AllTime => first_day_of_year(date),
        }
    }

    /// Calendar-safe step forward by one bucket. AllTime has no step.
    pub fn add_one(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => date + Days::new(7),
            Self::Monthly => date + Months::new(1),
            Self::Quarterly => date + Months::new(3),
            Self::Annually => date + Months::new(12),
            Self::AllTime => panic!("AllTime has no increment arithmetic"),
        }
    }

    /// Calendar-safe step backward by one bucket. AllTime has no step.
    pub fn subtract_one(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => date - Days::new(7),
            Self::Monthly => date - Months::new(1),
            Self::Quarterly => date - Months::new(3),
            Self::Annually => date - Months::new(12),
            Self::AllTime => panic!("AllTime has no increment arithmetic"),
        }
    }

    /// Long label for a bucket start date: "2025 Week 05", "2025 January",
    /// "2025 Q2", "2025".
    pub fn format_long(&self, date: NaiveDate) -> String {
        match self {
            Self::Weekly => {
                let iso = date.iso_week();
                format!("{} Week {:02}", iso.year(), iso.week())
            }
            Self::Monthly => date.format("%Y %B").to_string(),
            Self::Quarterly => format!("{} Q{}", date.year(), quarter_of_year(date)),
            Self::Annually => date.format("%Y").to_string(),
            Self::AllTime => "All time".to_string(),
        }
    }

    /// Compact label for chart axes: "25'W05", "25'Jan", "25'Q2".
    pub fn format_short(&self, date: NaiveDate) -> String {
        match self {
            Self::Weekly => {
                let iso = date.iso_week();
                format!("{:02}'W{:02}", iso.year() % 100, iso.week())
            }
            Self::Monthly => format!("{:02}'{}", date.year() % 100, date.format("%b")),
            Self::Quarterly => format!("{:02}'Q{}", date.year() % 100, quarter_of_year(date)),
            Self::Annually => date.format("%Y").to_string(),
            Self::AllTime => "All time".to_string(),
        }
    }
}

pub fn quarter_of_year(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

// ISO 8601: week 1 is the week containing the first Thursday of the year,
// so Jan 4 always falls in week 1. Anchor there and walk back to Monday
// instead of round-tripping through a week-of-year parse, which is ambiguous
// at week-1/week-53 boundaries.
fn first_day_of_iso_week(date: NaiveDate) -> NaiveDate {
    let iso = date.iso_week();
    let jan4 = NaiveDate::from_ymd_opt(iso.year(), 1, 4).unwrap();
    let monday = jan4 - Days::new(jan4.weekday().number_from_monday() as u64 - 1);
    monday + Days::new((iso.week() as u64 - 1) * 7)
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

fn first_day_of_quarter(date: NaiveDate) -> NaiveDate {
    let first_month = quarter_of_year(date) * 3 - 2;
    NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap()
}

fn first_day_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap()
}

// ---------------------------------------------------------------------------
// DateWindow — a [start, end) bucket window clamped to the data's range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DateWindow {
    inc: Increment,
    start: NaiveDate,
    end: NaiveDate,
    min_date: NaiveDate,
    max_date: NaiveDate,
}

impl DateWindow {
    /// Build a window of one `inc` bucket anchored on `anchor` (usually
    /// today), clamped to the data-derived `[min_date, max_date]` limits.
    pub fn new(inc: Increment, min_date: NaiveDate, max_date: NaiveDate, anchor: NaiveDate) -> Self {
        let mut w = DateWindow {
            inc,
            start: min_date,
            end: max_date,
            min_date,
            max_date,
        };
        w.reset_to(anchor);
        w
    }

    pub fn increment(&self) -> Increment {
        self.inc
    }

    /// Inclusive window start.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive window end.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn label(&self) -> String {
        self.inc.format_long(self.start)
    }

    /// Re-anchor the window on `anchor`, keeping the increment.
    pub fn reset_to(&mut self, anchor: NaiveDate) {
        if self.inc == Increment::AllTime {
            self.start = self.min_date;
            self.end = self.max_date + Days::new(1);
            return;
        }
        self.start = self.inc.first_day(anchor);
        self.end = self.inc.add_one(self.start);
        self.clamp();
    }

    pub fn set_increment(&mut self, inc: Increment) {
        if self.inc == inc {
            return;
        }
        let anchor = self.start;
        self.inc = inc;
        self.reset_to(anchor);
    }

    /// Slide one bucket forward. Returns false when the next bucket would
    /// leave the data range.
    pub fn next(&mut self) -> bool {
        if self.inc == Increment::AllTime {
            return false;
        }
        let next_end = self.inc.add_one(self.end);
        if next_end > self.max_end() {
            return false;
        }
        self.start = self.inc.add_one(self.start);
        self.end = next_end;
        true
    }

    /// Slide one bucket backward. Returns false when the previous bucket
    /// would leave the data range.
    pub fn prev(&mut self) -> bool {
        if self.inc == Increment::AllTime {
            return false;
        }
        let prev_start = self.inc.subtract_one(self.start);
        if prev_start < self.min_start() {
            return false;
        }
        self.start = prev_start;
        self.end = self.inc.subtract_one(self.end);
        true
    }

    fn min_start(&self) -> NaiveDate {
        self.inc.first_day(self.min_date)
    }

    fn max_end(&self) -> NaiveDate {
        self.inc.add_one(self.inc.first_day(self.max_date))
    }

    // Slide (never shrink) the window back inside the limits.
    fn clamp(&mut self) {
        if self.start < self.min_start() {
            self.start = self.min_start();
            self.end = self.inc.add_one(self.start);
        } else if self.end > self.max_end() {
            self.end = self.max_end();
            self.start = self.inc.subtract_one(self.end);
        }
    }
}
