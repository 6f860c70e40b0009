//! Cadence expressions and fire-instant computation.
//!
//! A cadence is a seconds-granularity cron expression with six fields:
//! `second minute hour day-of-month month day-of-week`. Each field is `*`, an
//! unsigned integer, or `*/N`. Five-field expressions (no seconds column) are
//! accepted and fire at second 0. Day-of-week uses standard cron numbering,
//! 0 = Sunday … 6 = Saturday, with 7 also meaning Sunday.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{Result, SchedulerError};

/// A parsed, validated cadence. Cheap to clone; carries no clock state.
#[derive(Debug, Clone)]
pub struct Cadence {
    expression: String,
    schedule: cron::Schedule,
}

impl Cadence {
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let six: Vec<&str> = match fields.len() {
            6 => fields.clone(),
            5 => std::iter::once("0").chain(fields.iter().copied()).collect(),
            n => {
                return Err(invalid(
                    expression,
                    format!("expected 5 or 6 fields, found {n}"),
                ))
            }
        };

        for (field, spec) in six.iter().zip(FIELDS.iter()) {
            check_field(field, spec).map_err(|reason| invalid(expression, reason))?;
        }

        let normalized = format!("{} {}", six[..5].join(" "), cron_day_of_week(six[5]));

        let schedule = cron::Schedule::from_str(&normalized)
            .map_err(|e| invalid(expression, first_line(&e.to_string())))?;

        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    /// The expression as written by the caller.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Smallest matching instant strictly after `from`, or `None` if the
    /// expression can never fire again (e.g. day 31 in a month field of 2).
    pub fn next_fire_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }

    /// Lazy, infinite sequence of fire instants after `from`. Calling this
    /// again with the same `from` restarts the sequence.
    pub fn upcoming(&self, from: DateTime<Utc>) -> Upcoming {
        Upcoming {
            cadence: self.clone(),
            cursor: from,
        }
    }
}

impl FromStr for Cadence {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        Cadence::parse(s)
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Owned iterator over fire instants; see [`Cadence::upcoming`].
#[derive(Debug, Clone)]
pub struct Upcoming {
    cadence: Cadence,
    cursor: DateTime<Utc>,
}

impl Iterator for Upcoming {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.cadence.next_fire_after(self.cursor)?;
        self.cursor = next;
        Some(next)
    }
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
}

const FIELDS: [FieldSpec; 6] = [
    FieldSpec { name: "second", min: 0, max: 59 },
    FieldSpec { name: "minute", min: 0, max: 59 },
    FieldSpec { name: "hour", min: 0, max: 23 },
    FieldSpec { name: "day-of-month", min: 1, max: 31 },
    FieldSpec { name: "month", min: 1, max: 12 },
    FieldSpec { name: "day-of-week", min: 0, max: 7 },
];

fn check_field(field: &str, spec: &FieldSpec) -> std::result::Result<(), String> {
    if field == "*" {
        return Ok(());
    }
    let (value, step) = match field.strip_prefix("*/") {
        Some(step) => (step, true),
        None => (field, false),
    };
    if !is_digits(value) {
        return Err(format!(
            "unsupported {} field '{field}' (use *, N or */N)",
            spec.name
        ));
    }
    let n: u32 = value
        .parse()
        .map_err(|_| format!("{} field '{field}' is out of range", spec.name))?;
    let ok = if step {
        (1..=spec.max).contains(&n)
    } else {
        (spec.min..=spec.max).contains(&n)
    };
    if ok {
        Ok(())
    } else if step {
        Err(format!(
            "{} step in '{field}' must be between 1 and {}",
            spec.name, spec.max
        ))
    } else {
        Err(format!(
            "{} value {n} must be between {} and {}",
            spec.name, spec.min, spec.max
        ))
    }
}

// The cron crate numbers weekdays 1 = Sunday .. 7 = Saturday. `*` and `*/N`
// select the same weekdays under both numberings.
fn cron_day_of_week(field: &str) -> String {
    match field.parse::<u32>() {
        Ok(7) => "1".to_string(),
        Ok(n) => (n + 1).to_string(),
        Err(_) => field.to_string(),
    }
}

// Keeps the message, drops any echo of the rewritten expression.
fn first_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("invalid cron expression")
        .to_string()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn invalid(expression: &str, reason: String) -> SchedulerError {
    SchedulerError::InvalidCadence {
        expression: expression.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn every_fifteen_seconds_lands_on_boundaries() {
        let cadence = Cadence::parse("*/15 * * * * *").unwrap();
        let t = at(0, 0, 0);
        let fires: Vec<_> = cadence.upcoming(t).take(4).collect();
        assert_eq!(
            fires,
            vec![
                t + Duration::seconds(15),
                t + Duration::seconds(30),
                t + Duration::seconds(45),
                t + Duration::seconds(60),
            ]
        );
        assert!(!fires.contains(&(t + Duration::seconds(7))));
    }

    #[test]
    fn next_fire_is_strictly_after_from() {
        let cadence = Cadence::parse("*/15 * * * * *").unwrap();
        assert_eq!(cadence.next_fire_after(at(0, 0, 15)), Some(at(0, 0, 30)));
        assert_eq!(cadence.next_fire_after(at(0, 0, 7)), Some(at(0, 0, 15)));
    }

    #[test]
    fn fixed_fields_roll_over_to_next_hour_and_day() {
        let hourly = Cadence::parse("0 0 * * * *").unwrap();
        assert_eq!(hourly.next_fire_after(at(12, 34, 56)), Some(at(13, 0, 0)));

        let nine_am = Cadence::parse("0 0 9 * * *").unwrap();
        assert_eq!(
            nine_am.next_fire_after(at(10, 0, 0)),
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn five_field_expressions_fire_at_second_zero() {
        let every_two_minutes = Cadence::parse("*/2 * * * *").unwrap();
        assert_eq!(
            every_two_minutes.next_fire_after(at(0, 0, 30)),
            Some(at(0, 2, 0))
        );
        assert_eq!(every_two_minutes.expression(), "*/2 * * * *");

        let six_hourly = Cadence::parse("0 */6 * * *").unwrap();
        assert_eq!(six_hourly.next_fire_after(at(1, 0, 0)), Some(at(6, 0, 0)));
    }

    #[test]
    fn same_input_same_output() {
        let cadence = Cadence::parse("*/30 * * * * *").unwrap();
        let from = at(8, 15, 3);
        assert_eq!(cadence.next_fire_after(from), cadence.next_fire_after(from));
        let first: Vec<_> = cadence.upcoming(from).take(3).collect();
        let again: Vec<_> = cadence.upcoming(from).take(3).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn rejects_malformed_expressions() {
        for expr in [
            "",
            "* * *",
            "* * * * * * *",
            "1-5 * * * * *",
            "1,2 * * * * *",
            "*/0 * * * * *",
            "*/x * * * * *",
            "MON * * * * *",
            "61 * * * * *",
            "0 0 24 * * *",
            "0 0 0 0 * *",
            "0 0 0 * 13 *",
            "0 0 9 * * 8",
            "*/60 * * * * *",
        ] {
            match Cadence::parse(expr) {
                Err(SchedulerError::InvalidCadence { expression, .. }) => {
                    assert_eq!(expression, expr)
                }
                other => panic!("expected InvalidCadence for {expr:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn day_of_week_uses_sunday_zero_numbering() {
        // 2026-01-01 is a Thursday.
        let thursday = at(0, 0, 0);
        let monday = Cadence::parse("0 9 * * 1").unwrap();
        assert_eq!(
            monday.next_fire_after(thursday),
            Some(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap())
        );

        let sunday = Cadence::parse("0 0 9 * * 0").unwrap();
        let expected_sunday = Utc.with_ymd_and_hms(2026, 1, 4, 9, 0, 0).unwrap();
        assert_eq!(sunday.next_fire_after(thursday), Some(expected_sunday));
        let also_sunday = Cadence::parse("0 9 * * 7").unwrap();
        assert_eq!(also_sunday.next_fire_after(thursday), Some(expected_sunday));

        let saturday = Cadence::parse("0 9 * * 6").unwrap();
        assert_eq!(
            saturday.next_fire_after(thursday),
            Some(Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejection_reason_names_the_field_as_written() {
        match Cadence::parse("0 9 * * 8") {
            Err(SchedulerError::InvalidCadence { expression, reason }) => {
                assert_eq!(expression, "0 9 * * 8");
                assert!(reason.contains("day-of-week"), "{reason}");
                assert!(!reason.contains("0 0 9"), "{reason}");
            }
            other => panic!("expected InvalidCadence, got {other:?}"),
        }
        match Cadence::parse("61 * * * *") {
            Err(SchedulerError::InvalidCadence { reason, .. }) => {
                assert!(reason.contains("minute value 61"), "{reason}");
            }
            other => panic!("expected InvalidCadence, got {other:?}"),
        }
    }

    #[test]
    fn from_str_matches_parse() {
        let cadence: Cadence = "*/5 * * * * *".parse().unwrap();
        assert_eq!(cadence.to_string(), "*/5 * * * * *");
    }
}
