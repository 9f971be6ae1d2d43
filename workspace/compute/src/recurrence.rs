//! Month-window calculation for contribution types.
//!
//! Every function here is pure: it turns a contribution type's mode and date
//! bounds into the ordered, deduplicated list of first-of-month dates the
//! obligation covers. Dates are normalized to the first of their month before
//! any comparison, so schedule keys do not depend on the day part of inputs.

use chrono::{Datelike, Months, NaiveDate};
use model::entities::contribution;
use model::entities::contribution_type::{self, ContributionMode};
use rust_decimal::Decimal;
use thiserror::Error;

/// How far ahead open-ended contributions are materialized, in months.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// Why a month window could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("contribution type has no start date")]
    MissingStartDate,

    #[error("recurring contribution type has no end date")]
    MissingEndDate,

    #[error("one-time window contribution type has no period_months")]
    MissingPeriodMonths,

    #[error("period_months must be positive, got {0}")]
    InvalidPeriodMonths(i32),

    #[error("window from {start} to {end} is empty")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },

    #[error("no scheduled month falls within the enrollment period")]
    OutsideEnrollment,

    #[error("month arithmetic left the supported date range")]
    DateOutOfRange,
}

/// The scheduling parameters of a contribution type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub mode: ContributionMode,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub period_months: Option<i32>,
}

impl RecurrenceRule {
    pub fn for_type(contribution_type: &contribution_type::Model) -> Self {
        Self {
            mode: contribution_type.mode,
            start_date: contribution_type.start_date,
            end_date: contribution_type.end_date,
            period_months: contribution_type.period_months,
        }
    }
}

/// Normalizes a date to the first day of its month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Adds whole months to a first-of-month date.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Every first-of-month from `start` to `end`, both inclusive.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let end = first_of_month(end);
    let mut months = Vec::new();
    let mut current = first_of_month(start);
    while current <= end {
        months.push(current);
        match add_months(current, 1) {
            Some(next) => current = next,
            None => break,
        }
    }
    months
}

/// Computes the months a rule covers.
///
/// `today` and `horizon_months` only matter for open-ended rules, which are
/// materialized up to `first_of_month(today) + horizon_months`.
pub fn schedule_months(
    rule: &RecurrenceRule,
    today: NaiveDate,
    horizon_months: u32,
) -> Result<Vec<NaiveDate>, RecurrenceError> {
    let start = first_of_month(rule.start_date.ok_or(RecurrenceError::MissingStartDate)?);

    let end = match rule.mode {
        ContributionMode::Recurring => {
            first_of_month(rule.end_date.ok_or(RecurrenceError::MissingEndDate)?)
        }
        ContributionMode::OneTimeWindow => {
            let period = rule.period_months.ok_or(RecurrenceError::MissingPeriodMonths)?;
            if period <= 0 {
                return Err(RecurrenceError::InvalidPeriodMonths(period));
            }
            add_months(start, (period - 1) as u32).ok_or(RecurrenceError::DateOutOfRange)?
        }
        ContributionMode::OpenEndedRecurring => add_months(first_of_month(today), horizon_months)
            .ok_or(RecurrenceError::DateOutOfRange)?,
    };

    if end < start {
        return Err(RecurrenceError::EmptyWindow { start, end });
    }

    Ok(months_between(start, end))
}

/// Like [`schedule_months`], but a malformed rule simply covers no months.
pub fn months_or_empty(rule: &RecurrenceRule, today: NaiveDate, horizon_months: u32) -> Vec<NaiveDate> {
    schedule_months(rule, today, horizon_months).unwrap_or_default()
}

/// Months owed for one member contribution: the type's window clipped to the
/// contribution's own start and end months.
pub fn contribution_months(
    contribution: &contribution::Model,
    contribution_type: &contribution_type::Model,
    today: NaiveDate,
    horizon_months: u32,
) -> Result<Vec<NaiveDate>, RecurrenceError> {
    let months = schedule_months(
        &RecurrenceRule::for_type(contribution_type),
        today,
        horizon_months,
    )?;

    let lower = first_of_month(contribution.start_date);
    let upper = contribution.end_date.map(first_of_month);
    let clipped: Vec<NaiveDate> = months
        .into_iter()
        .filter(|month| *month >= lower && upper.is_none_or(|upper| *month <= upper))
        .collect();

    if clipped.is_empty() {
        return Err(RecurrenceError::OutsideEnrollment);
    }
    Ok(clipped)
}

/// Amount expected for a single schedule month of a contribution.
///
/// One-time windows spread the contribution amount over `period_months`;
/// every other mode bills the full amount each month.
pub fn expected_amount_per_month(
    contribution: &contribution::Model,
    contribution_type: &contribution_type::Model,
) -> Decimal {
    match (contribution_type.mode, contribution_type.period_months) {
        (ContributionMode::OneTimeWindow, Some(period)) if period > 0 => {
            contribution.amount / Decimal::from(period)
        }
        _ => contribution.amount,
    }
}
