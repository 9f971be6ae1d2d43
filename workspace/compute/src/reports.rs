//! Twelve-month rollups for a calendar year.
//!
//! Amounts are accumulated as exact decimals and rounded to cents only once
//! per bucket, after all rows have been added.

use chrono::{Datelike, NaiveDate};
use common::{MonthlySummary, PenaltyMonthlySummary, round_money};
use model::entities::contribution_type::is_penalty_type_name;
use model::entities::payment::PaymentType;
use model::entities::penalty::PenaltyOrigin;
use model::entities::{contribution, contribution_schedule, contribution_type, payment, penalty};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
};
use tracing::{debug, instrument, trace};

use crate::error::{ComputeError, Result};

/// First and last schedule month of a calendar year.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ComputeError::Validation(format!("year {} is out of range", year))),
    }
}

fn matches_type(name: &str, type_name: Option<&str>) -> bool {
    type_name.is_none_or(|wanted| name.trim().eq_ignore_ascii_case(wanted.trim()))
}

/// Expected vs. paid contributions per month of `year`.
///
/// Expected sums the contribution amount of every schedule row in the month,
/// leaving out the penalty type. Paid sums contribution payments linked to
/// those rows. Asking for the penalty type reports penalty payments instead,
/// with nothing expected. `type_name` is matched case-insensitively.
#[instrument(skip(db))]
pub async fn monthly_contribution_summary<C: ConnectionTrait>(
    db: &C,
    year: i32,
    type_name: Option<&str>,
) -> Result<Vec<MonthlySummary>> {
    trace!("Entering monthly_contribution_summary");
    let (start, end) = year_bounds(year)?;
    let penalty_view = type_name.is_some_and(is_penalty_type_name);

    let mut expected = [Decimal::ZERO; 12];
    let mut paid = [Decimal::ZERO; 12];

    if !penalty_view {
        let schedules: Vec<(NaiveDate, Decimal, String)> = contribution_schedule::Entity::find()
            .select_only()
            .column(contribution_schedule::Column::Month)
            .column(contribution::Column::Amount)
            .column(contribution_type::Column::Name)
            .join(
                JoinType::InnerJoin,
                contribution_schedule::Relation::Contribution.def(),
            )
            .join(
                JoinType::InnerJoin,
                contribution::Relation::ContributionType.def(),
            )
            .filter(contribution_schedule::Column::Month.between(start, end))
            .into_tuple()
            .all(db)
            .await?;
        debug!("Loaded {} schedule rows for {}", schedules.len(), year);

        for (month, amount, name) in schedules {
            if is_penalty_type_name(&name) || !matches_type(&name, type_name) {
                continue;
            }
            expected[month.month0() as usize] += amount;
        }
    }

    let payment_type = if penalty_view {
        PaymentType::Penalty
    } else {
        PaymentType::Contribution
    };
    let payments: Vec<(NaiveDate, Decimal, String)> = payment::Entity::find()
        .select_only()
        .column(contribution_schedule::Column::Month)
        .column(payment::Column::PaidAmount)
        .column(contribution_type::Column::Name)
        .join(
            JoinType::InnerJoin,
            payment::Relation::ContributionSchedule.def(),
        )
        .join(
            JoinType::InnerJoin,
            contribution_schedule::Relation::Contribution.def(),
        )
        .join(
            JoinType::InnerJoin,
            contribution::Relation::ContributionType.def(),
        )
        .filter(contribution_schedule::Column::Month.between(start, end))
        .filter(payment::Column::PaymentType.eq(payment_type))
        .into_tuple()
        .all(db)
        .await?;
    debug!("Loaded {} {:?} payments for {}", payments.len(), payment_type, year);

    for (month, amount, name) in payments {
        if !penalty_view && (is_penalty_type_name(&name) || !matches_type(&name, type_name)) {
            continue;
        }
        paid[month.month0() as usize] += amount;
    }

    Ok((1..=12u32)
        .map(|month| {
            let index = (month - 1) as usize;
            MonthlySummary {
                expected: round_money(expected[index]),
                paid: round_money(paid[index]),
                ..MonthlySummary::empty(month)
            }
        })
        .collect())
}

/// Automatic vs. manual penalties per missed month of `year`, waived ones excluded.
#[instrument(skip(db))]
pub async fn monthly_penalty_summary<C: ConnectionTrait>(
    db: &C,
    year: i32,
) -> Result<Vec<PenaltyMonthlySummary>> {
    trace!("Entering monthly_penalty_summary");
    let (start, end) = year_bounds(year)?;

    let penalties: Vec<(NaiveDate, PenaltyOrigin, Decimal, Decimal)> = penalty::Entity::find()
        .select_only()
        .column(penalty::Column::MissedMonth)
        .column(penalty::Column::Generated)
        .column(penalty::Column::ExpectedAmount)
        .column(penalty::Column::PaidAmount)
        .filter(penalty::Column::MissedMonth.between(start, end))
        .filter(penalty::Column::Waived.eq(false))
        .into_tuple()
        .all(db)
        .await?;
    debug!("Loaded {} penalties for {}", penalties.len(), year);

    let mut rows: Vec<PenaltyMonthlySummary> = (1..=12u32).map(PenaltyMonthlySummary::empty).collect();
    for (missed_month, generated, expected, collected) in penalties {
        let row = &mut rows[missed_month.month0() as usize];
        match generated {
            PenaltyOrigin::Automatically => {
                row.auto_expected += expected;
                row.auto_collected += collected;
            }
            PenaltyOrigin::Manually => {
                row.manual_expected += expected;
                row.manual_collected += collected;
            }
        }
    }

    for row in &mut rows {
        row.auto_expected = round_money(row.auto_expected);
        row.auto_collected = round_money(row.auto_collected);
        row.manual_expected = round_money(row.manual_expected);
        row.manual_collected = round_money(row.manual_collected);
    }
    Ok(rows)
}
