use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Semantic category of a raw issue status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Done,
    InProgress,
    ToDo,
    Undefined,
}

impl StatusCategory {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "Done",
            Self::InProgress => "InProgress",
            Self::ToDo => "ToDo",
            Self::Undefined => "undefined",
        }
    }

    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }

    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn is_to_do(self) -> bool {
        matches!(self, Self::ToDo)
    }
}

/// Whether an epic's deadline moved or is being met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanningStatus {
    Overdue,
    Postponed,
    Advanced,
    Ok,
    Replanned,
}

impl PlanningStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::Postponed => "Postponed",
            Self::Advanced => "Advanced",
            Self::Ok => "Ok",
            Self::Replanned => "Replanned",
        }
    }
}

/// The four mutually exclusive summary buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Done,
    Overdue,
    Ongoing,
    Outstanding,
}

impl Bucket {
    /// Report order: Done, Ongoing, Overdue, Outstanding.
    pub const REPORT_ORDER: [Self; 4] = [Self::Done, Self::Ongoing, Self::Overdue, Self::Outstanding];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "Done",
            Self::Overdue => "Overdue",
            Self::Ongoing => "Ongoing",
            Self::Outstanding => "Outstanding",
        }
    }

    /// Heading used by rendered reports and chart legends.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Outstanding => "To Do",
            other => other.as_str(),
        }
    }
}

/// Calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Quarter containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        match date.month() {
            1..=3 => Self::Q1,
            4..=6 => Self::Q2,
            7..=9 => Self::Q3,
            _ => Self::Q4,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PlanningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace([' ', '_', '-'], "")
}

impl FromStr for PlanningStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "overdue" => Ok(Self::Overdue),
            "postponed" => Ok(Self::Postponed),
            "advanced" => Ok(Self::Advanced),
            "ok" | "ontime" => Ok(Self::Ok),
            "replanned" => Ok(Self::Replanned),
            _ => Err(ParseEnumError {
                expected: "planning status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Bucket {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "done" => Ok(Self::Done),
            "overdue" => Ok(Self::Overdue),
            "ongoing" => Ok(Self::Ongoing),
            "outstanding" | "todo" => Ok(Self::Outstanding),
            _ => Err(ParseEnumError {
                expected: "bucket",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bucket, PlanningStatus, Quarter, StatusCategory};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(Quarter::of(date(2024, 1, 1)), Quarter::Q1);
        assert_eq!(Quarter::of(date(2024, 3, 31)), Quarter::Q1);
        assert_eq!(Quarter::of(date(2024, 4, 1)), Quarter::Q2);
        assert_eq!(Quarter::of(date(2024, 9, 30)), Quarter::Q3);
        assert_eq!(Quarter::of(date(2024, 10, 1)), Quarter::Q4);
        assert_eq!(Quarter::of(date(2024, 12, 31)), Quarter::Q4);
        assert_eq!(Quarter::Q3.to_string(), "Q3");
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in [
            PlanningStatus::Overdue,
            PlanningStatus::Postponed,
            PlanningStatus::Advanced,
            PlanningStatus::Ok,
            PlanningStatus::Replanned,
        ] {
            assert_eq!(PlanningStatus::from_str(&value.to_string()).unwrap(), value);
        }

        for value in [Bucket::Done, Bucket::Overdue, Bucket::Ongoing, Bucket::Outstanding] {
            assert_eq!(Bucket::from_str(&value.to_string()).unwrap(), value);
        }
    }

    #[test]
    fn outstanding_displays_as_to_do() {
        assert_eq!(Bucket::Outstanding.display_name(), "To Do");
        assert_eq!(Bucket::from_str("To Do").unwrap(), Bucket::Outstanding);
        assert_eq!(Bucket::Ongoing.display_name(), "Ongoing");
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(PlanningStatus::from_str("late").is_err());
        assert!(Bucket::from_str("blocked").is_err());
    }

    #[test]
    fn category_predicates() {
        assert!(StatusCategory::Done.is_done());
        assert!(StatusCategory::ToDo.is_to_do());
        assert!(StatusCategory::InProgress.is_in_progress());
        assert!(!StatusCategory::Undefined.is_done());
        assert_eq!(StatusCategory::Undefined.to_string(), "undefined");
    }
}
