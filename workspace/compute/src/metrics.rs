//! KPI cards comparing a month with the month before it.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};
use common::{MetricCard, percentage_change, round_money};
use model::entities::member::{self, MemberStatus};
use model::entities::payment::{self, PaymentType};
use model::entities::{contribution_schedule, penalty};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use tracing::{debug, instrument, trace};

use crate::error::{ComputeError, Result};
use crate::recurrence::add_months;

/// The metrics a card can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Active members who joined on or before the end of the month
    TotalMembers,
    /// Members who joined during the month
    NewMembers,
    CollectedContributions,
    CollectedPenalties,
    /// Sum of expected amounts of the month's schedule rows
    ExpectedContributions,
    /// Open penalties for misses in the month
    UnpaidPenalties,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::TotalMembers,
        MetricKind::NewMembers,
        MetricKind::CollectedContributions,
        MetricKind::CollectedPenalties,
        MetricKind::ExpectedContributions,
        MetricKind::UnpaidPenalties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::TotalMembers => "total_members",
            MetricKind::NewMembers => "new_members",
            MetricKind::CollectedContributions => "collected_contributions",
            MetricKind::CollectedPenalties => "collected_penalties",
            MetricKind::ExpectedContributions => "expected_contributions",
            MetricKind::UnpaidPenalties => "unpaid_penalties",
        }
    }

    pub fn calculator(&self) -> Box<dyn MetricCalculator> {
        match self {
            MetricKind::TotalMembers => Box::new(TotalMembers),
            MetricKind::NewMembers => Box::new(NewMembers),
            MetricKind::CollectedContributions => Box::new(CollectedPayments {
                payment_type: PaymentType::Contribution,
            }),
            MetricKind::CollectedPenalties => Box::new(CollectedPayments {
                payment_type: PaymentType::Penalty,
            }),
            MetricKind::ExpectedContributions => Box::new(ExpectedContributions),
            MetricKind::UnpaidPenalties => Box::new(UnpaidPenalties),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ComputeError::Validation(format!("unknown metric type '{}'", s)))
    }
}

/// A calendar month as an inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MonthRange {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ComputeError::Validation(format!("invalid month {}-{}", year, month)))?;
        let last = add_months(first, 1)
            .and_then(|next| next.checked_sub_days(Days::new(1)))
            .ok_or_else(|| ComputeError::Validation(format!("month {}-{} is out of range", year, month)))?;
        Ok(Self { first, last })
    }

    pub fn previous(&self) -> Result<Self> {
        let (year, month) = match self.first.month() {
            1 => (self.first.year() - 1, 12),
            month => (self.first.year(), month - 1),
        };
        Self::new(year, month)
    }
}

#[async_trait]
pub trait MetricCalculator: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Value of the metric for a single month.
    async fn value_for_month(&self, db: &DatabaseConnection, month: MonthRange) -> Result<Decimal>;
}

pub struct TotalMembers;

#[async_trait]
impl MetricCalculator for TotalMembers {
    fn kind(&self) -> MetricKind {
        MetricKind::TotalMembers
    }

    async fn value_for_month(&self, db: &DatabaseConnection, month: MonthRange) -> Result<Decimal> {
        let count = member::Entity::find()
            .filter(member::Column::Status.eq(MemberStatus::Active))
            .filter(member::Column::JoinedDate.lte(month.last))
            .count(db)
            .await?;
        Ok(Decimal::from(count))
    }
}

pub struct NewMembers;

#[async_trait]
impl MetricCalculator for NewMembers {
    fn kind(&self) -> MetricKind {
        MetricKind::NewMembers
    }

    async fn value_for_month(&self, db: &DatabaseConnection, month: MonthRange) -> Result<Decimal> {
        let count = member::Entity::find()
            .filter(member::Column::JoinedDate.between(month.first, month.last))
            .count(db)
            .await?;
        Ok(Decimal::from(count))
    }
}

/// Money received in the month, by payment date.
pub struct CollectedPayments {
    pub payment_type: PaymentType,
}

#[async_trait]
impl MetricCalculator for CollectedPayments {
    fn kind(&self) -> MetricKind {
        match self.payment_type {
            PaymentType::Contribution => MetricKind::CollectedContributions,
            PaymentType::Penalty => MetricKind::CollectedPenalties,
        }
    }

    async fn value_for_month(&self, db: &DatabaseConnection, month: MonthRange) -> Result<Decimal> {
        let amounts: Vec<Decimal> = payment::Entity::find()
            .select_only()
            .column(payment::Column::PaidAmount)
            .filter(payment::Column::PaymentType.eq(self.payment_type))
            .filter(payment::Column::PaymentDate.between(month.first, month.last))
            .into_tuple()
            .all(db)
            .await?;
        Ok(amounts.into_iter().sum())
    }
}

pub struct ExpectedContributions;

#[async_trait]
impl MetricCalculator for ExpectedContributions {
    fn kind(&self) -> MetricKind {
        MetricKind::ExpectedContributions
    }

    async fn value_for_month(&self, db: &DatabaseConnection, month: MonthRange) -> Result<Decimal> {
        let amounts: Vec<Decimal> = contribution_schedule::Entity::find()
            .select_only()
            .column(contribution_schedule::Column::ExpectedAmount)
            .filter(contribution_schedule::Column::Month.eq(month.first))
            .into_tuple()
            .all(db)
            .await?;
        Ok(amounts.into_iter().sum())
    }
}

pub struct UnpaidPenalties;

#[async_trait]
impl MetricCalculator for UnpaidPenalties {
    fn kind(&self) -> MetricKind {
        MetricKind::UnpaidPenalties
    }

    async fn value_for_month(&self, db: &DatabaseConnection, month: MonthRange) -> Result<Decimal> {
        let count = penalty::Entity::find()
            .filter(penalty::Column::ResolvedAt.is_null())
            .filter(penalty::Column::Waived.eq(false))
            .filter(penalty::Column::MissedMonth.between(month.first, month.last))
            .count(db)
            .await?;
        Ok(Decimal::from(count))
    }
}

/// Builds the card for `kind` in the given month, compared with the month before.
#[instrument(skip(db))]
pub async fn metric_card(
    db: &DatabaseConnection,
    kind: MetricKind,
    year: i32,
    month: u32,
) -> Result<MetricCard> {
    trace!("Entering metric_card");
    let current_range = MonthRange::new(year, month)?;
    let previous_range = current_range.previous()?;

    let calculator = kind.calculator();
    let current = calculator.value_for_month(db, current_range).await?;
    let previous = calculator.value_for_month(db, previous_range).await?;
    debug!("{} for {}-{}: current {}, previous {}", kind, year, month, current, previous);

    Ok(MetricCard {
        value: round_money(current),
        percentage_change: percentage_change(current, previous),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::helpers::*;
    use crate::testing::{date, setup_db};
    use model::entities::contribution_type::ContributionMode;
    use model::entities::penalty::PenaltyOrigin;

    #[test]
    fn test_parse_metric_kind() {
        assert_eq!(
            "total_members".parse::<MetricKind>().unwrap(),
            MetricKind::TotalMembers
        );
        assert_eq!(
            " Collected_Penalties ".parse::<MetricKind>().unwrap(),
            MetricKind::CollectedPenalties
        );
        assert!("revenue".parse::<MetricKind>().is_err());
        for kind in MetricKind::ALL {
            assert_eq!(kind.as_str().parse::<MetricKind>().unwrap(), kind);
            assert_eq!(kind.calculator().kind(), kind);
        }
    }

    #[test]
    fn test_previous_month_wraps_year() {
        let january = MonthRange::new(2024, 1).unwrap();
        let december = january.previous().unwrap();
        assert_eq!(december.first, date(2023, 12, 1));
        assert_eq!(december.last, date(2023, 12, 31));

        let february = MonthRange::new(2024, 2).unwrap();
        assert_eq!(february.last, date(2024, 2, 29));
        assert!(MonthRange::new(2024, 13).is_err());
    }

    #[tokio::test]
    async fn test_member_counts() {
        let db = setup_db().await.unwrap();
        new_member_joined(&db, MemberStatus::Active, date(2023, 12, 5)).await.unwrap();
        new_member_joined(&db, MemberStatus::Active, date(2024, 1, 10)).await.unwrap();
        new_member_joined(&db, MemberStatus::Active, date(2024, 1, 31)).await.unwrap();
        new_member_joined(&db, MemberStatus::Left, date(2024, 1, 15)).await.unwrap();

        let total = metric_card(&db, MetricKind::TotalMembers, 2024, 1).await.unwrap();
        assert_eq!(total.value, Decimal::from(3));
        // 1 -> 3
        assert_eq!(total.percentage_change, Some(Decimal::from(200)));

        let new = metric_card(&db, MetricKind::NewMembers, 2024, 1).await.unwrap();
        assert_eq!(new.value, Decimal::from(3));
        assert_eq!(new.percentage_change, Some(Decimal::from(200)));
    }

    #[tokio::test]
    async fn test_collected_and_expected_amounts() {
        let db = setup_db().await.unwrap();
        let member = new_member(&db, MemberStatus::Active).await.unwrap();
        let dues = new_contribution_type(
            &db,
            "Monthly Dues",
            ContributionMode::Recurring,
            Some(date(2024, 1, 1)),
            Some(date(2024, 12, 1)),
            None,
        )
        .await
        .unwrap();
        let contribution = new_contribution(&db, &member, &dues, Decimal::from(100), date(2024, 1, 1))
            .await
            .unwrap();
        let january = new_schedule(&db, &contribution, date(2024, 1, 1), Decimal::ZERO)
            .await
            .unwrap();
        let february = new_schedule(&db, &contribution, date(2024, 2, 1), Decimal::ZERO)
            .await
            .unwrap();
        new_payment(&db, &january, Decimal::from(80), PaymentType::Contribution, date(2024, 1, 20))
            .await
            .unwrap();
        new_payment(&db, &february, Decimal::from(100), PaymentType::Contribution, date(2024, 2, 3))
            .await
            .unwrap();
        new_payment(&db, &february, Decimal::from(50), PaymentType::Penalty, date(2024, 2, 3))
            .await
            .unwrap();

        let collected = metric_card(&db, MetricKind::CollectedContributions, 2024, 2)
            .await
            .unwrap();
        assert_eq!(collected.value, Decimal::from(100));
        assert_eq!(collected.percentage_change, Some(Decimal::from(25)));

        let penalties = metric_card(&db, MetricKind::CollectedPenalties, 2024, 2)
            .await
            .unwrap();
        assert_eq!(penalties.value, Decimal::from(50));
        assert_eq!(penalties.percentage_change, None);

        let expected = metric_card(&db, MetricKind::ExpectedContributions, 2024, 2)
            .await
            .unwrap();
        assert_eq!(expected.value, Decimal::from(100));
        assert_eq!(expected.percentage_change, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_unpaid_penalties_ignore_resolved_and_waived() {
        let db = setup_db().await.unwrap();
        let member = new_member(&db, MemberStatus::Active).await.unwrap();
        let dues = new_contribution_type(
            &db,
            "Monthly Dues",
            ContributionMode::Recurring,
            Some(date(2024, 1, 1)),
            Some(date(2024, 12, 1)),
            None,
        )
        .await
        .unwrap();
        let contribution = new_contribution(&db, &member, &dues, Decimal::from(100), date(2024, 1, 1))
            .await
            .unwrap();
        new_penalty(&db, &contribution, date(2024, 3, 1), Decimal::from(50), PenaltyOrigin::Automatically)
            .await
            .unwrap();
        new_penalty(&db, &contribution, date(2024, 3, 1), Decimal::from(50), PenaltyOrigin::Manually)
            .await
            .unwrap();
        let waived = new_penalty(&db, &contribution, date(2024, 3, 1), Decimal::from(50), PenaltyOrigin::Manually)
            .await
            .unwrap();
        crate::payments::waive_penalty(&db, waived.id, date(2024, 3, 5).and_hms_opt(8, 0, 0).unwrap())
            .await
            .unwrap();

        let card = metric_card(&db, MetricKind::UnpaidPenalties, 2024, 3).await.unwrap();
        assert_eq!(card.value, Decimal::from(2));
        assert_eq!(card.percentage_change, None);
    }
}
