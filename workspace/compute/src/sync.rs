//! Transactional re-projection of a single contribution.
//!
//! After an edit the contribution's schedule rows, balance and unresolved
//! penalties are brought back in line with its new amount, dates and type.
//! Every step runs inside one transaction; nothing is visible to other
//! readers unless all of them succeed.

use std::collections::HashSet;

use chrono::NaiveDate;
use common::display_amount;
use model::entities::contribution_type::ContributionMode;
use model::entities::{contribution, contribution_schedule, contribution_type, penalty};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, trace};

use crate::atomic::finish;
use crate::balance::recompute_balance;
use crate::error::{ComputeError, Result};
use crate::recurrence::{add_months, first_of_month};

/// Fields of a contribution that can be edited. Absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContributionUpdate {
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub contribution_type_id: Option<i32>,
}

impl ContributionUpdate {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.contribution_type_id.is_none()
    }

    /// Checks the update on its own, before any record is loaded.
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            if amount < Decimal::ZERO {
                return Err(ComputeError::Validation(format!(
                    "amount must not be negative, got {}",
                    amount
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            check_date_order(start, end)?;
        }
        Ok(())
    }
}

/// A contribution together with the type it currently belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionWithType {
    pub contribution: contribution::Model,
    pub contribution_type: contribution_type::Model,
}

/// What a sync changed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub created: u64,
    pub refreshed: u64,
    pub deleted: u64,
    pub repriced_penalties: u64,
    pub balance: Decimal,
}

fn check_date_order(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(ComputeError::Validation(format!(
            "end_date {} is before start_date {}",
            end, start
        )));
    }
    Ok(())
}

/// Applies `update` to a contribution and re-projects its schedules, balance
/// and unresolved penalties in one transaction.
///
/// Storage failures inside the transaction roll everything back and surface
/// as [`ComputeError::Transaction`].
#[instrument(skip(db, update), fields(contribution_id = contribution_id))]
pub async fn update_contribution_and_sync<C>(
    db: &C,
    contribution_id: i32,
    update: ContributionUpdate,
) -> Result<ContributionWithType>
where
    C: ConnectionTrait + TransactionTrait,
{
    trace!("Entering update_contribution_and_sync");
    debug!("Contribution update: {:?}", update);
    update.validate()?;

    let txn = db.begin().await?;
    let result = apply_and_sync(&txn, contribution_id, &update).await;
    let (synced, outcome) = finish(txn, result, "contribution sync").await?;

    info!(
        "Synced contribution {}: {} created, {} refreshed, {} deleted, {} penalties repriced, balance {}",
        contribution_id,
        outcome.created,
        outcome.refreshed,
        outcome.deleted,
        outcome.repriced_penalties,
        display_amount(outcome.balance)
    );
    Ok(synced)
}

async fn apply_and_sync<C: ConnectionTrait>(
    txn: &C,
    contribution_id: i32,
    update: &ContributionUpdate,
) -> Result<(ContributionWithType, SyncOutcome)> {
    let existing = contribution::Entity::find_by_id(contribution_id)
        .one(txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Contribution", contribution_id))?;

    let type_id = update
        .contribution_type_id
        .unwrap_or(existing.contribution_type_id);
    let contribution_type = contribution_type::Entity::find_by_id(type_id)
        .one(txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("ContributionType", type_id))?;

    let start_date = update.start_date.unwrap_or(existing.start_date);
    let end_date = update.end_date.or(existing.end_date);
    if let Some(end) = end_date {
        check_date_order(start_date, end)?;
    }

    let contribution = if update.is_empty() {
        existing
    } else {
        let mut active: contribution::ActiveModel = existing.into();
        if let Some(amount) = update.amount {
            active.amount = Set(amount);
        }
        if let Some(start) = update.start_date {
            active.start_date = Set(start);
        }
        if let Some(end) = update.end_date {
            active.end_date = Set(Some(end));
        }
        if let Some(type_id) = update.contribution_type_id {
            active.contribution_type_id = Set(type_id);
        }
        active.update(txn).await?
    };

    let outcome = sync_window(txn, &contribution, &contribution_type).await?;
    Ok((
        ContributionWithType {
            contribution,
            contribution_type,
        },
        outcome,
    ))
}

/// Number of months the synchronizer spreads a contribution over.
/// One-time windows use the type's period; every other mode covers one month.
pub fn sync_window_months(contribution_type: &contribution_type::Model) -> Result<u32> {
    match contribution_type.mode {
        ContributionMode::OneTimeWindow => match contribution_type.period_months {
            Some(period) if period > 0 => Ok(period as u32),
            Some(period) => Err(ComputeError::Validation(format!(
                "contribution type {} has non-positive period_months {}",
                contribution_type.id, period
            ))),
            None => Err(ComputeError::Validation(format!(
                "contribution type {} has no period_months",
                contribution_type.id
            ))),
        },
        _ => Ok(1),
    }
}

/// Reconciles the schedule rows, balance and penalties of one contribution.
/// Expects to run inside a transaction owned by the caller.
pub async fn sync_window<C: ConnectionTrait>(
    txn: &C,
    contribution: &contribution::Model,
    contribution_type: &contribution_type::Model,
) -> Result<SyncOutcome> {
    let months = sync_window_months(contribution_type)?;
    let start = first_of_month(contribution.start_date);
    let window: Vec<NaiveDate> = (0..months)
        .map(|offset| add_months(start, offset))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            ComputeError::Validation(format!(
                "window of {} months from {} is out of range",
                months, start
            ))
        })?;
    let monthly_amount = contribution.amount / Decimal::from(months);
    debug!(
        "Contribution {} window {:?}, {} per month",
        contribution.id, window, monthly_amount
    );

    let mut outcome = SyncOutcome::default();

    let existing = contribution_schedule::Entity::find()
        .filter(contribution_schedule::Column::MemberId.eq(contribution.member_id))
        .filter(contribution_schedule::Column::ContributionId.eq(contribution.id))
        .all(txn)
        .await?;
    let window_set: HashSet<NaiveDate> = window.iter().copied().collect();
    let existing_months: HashSet<NaiveDate> = existing.iter().map(|row| row.month).collect();

    // Rows already in the window keep their payment state
    let in_window: Vec<i32> = existing
        .iter()
        .filter(|row| window_set.contains(&row.month))
        .map(|row| row.id)
        .collect();
    if !in_window.is_empty() {
        outcome.refreshed = contribution_schedule::Entity::update_many()
            .col_expr(
                contribution_schedule::Column::ExpectedAmount,
                Expr::value(monthly_amount),
            )
            .filter(contribution_schedule::Column::Id.is_in(in_window))
            .exec(txn)
            .await?
            .rows_affected;
    }

    let missing: Vec<contribution_schedule::ActiveModel> = window
        .iter()
        .filter(|month| !existing_months.contains(month))
        .map(|month| contribution_schedule::ActiveModel {
            member_id: Set(contribution.member_id),
            contribution_id: Set(contribution.id),
            month: Set(*month),
            expected_amount: Set(monthly_amount),
            paid_amount: Set(Decimal::ZERO),
            is_paid: Set(false),
            ..Default::default()
        })
        .collect();
    if !missing.is_empty() {
        outcome.created = contribution_schedule::Entity::insert_many(missing)
            .on_conflict(
                OnConflict::columns([
                    contribution_schedule::Column::MemberId,
                    contribution_schedule::Column::ContributionId,
                    contribution_schedule::Column::Month,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
    }

    let outside: Vec<i32> = existing
        .iter()
        .filter(|row| !window_set.contains(&row.month))
        .map(|row| row.id)
        .collect();
    if !outside.is_empty() {
        outcome.deleted = contribution_schedule::Entity::delete_many()
            .filter(contribution_schedule::Column::Id.is_in(outside))
            .exec(txn)
            .await?
            .rows_affected;
    }

    outcome.balance = recompute_balance(txn, contribution).await?;
    outcome.repriced_penalties = reprice_penalties(txn, contribution, contribution_type).await?;

    Ok(outcome)
}

/// Sets the type's current penalty price on every unresolved penalty of the
/// contribution that carries a different amount.
async fn reprice_penalties<C: ConnectionTrait>(
    txn: &C,
    contribution: &contribution::Model,
    contribution_type: &contribution_type::Model,
) -> Result<u64> {
    let stale: Vec<i32> = penalty::Entity::find()
        .filter(penalty::Column::ContributionId.eq(contribution.id))
        .filter(penalty::Column::ResolvedAt.is_null())
        .all(txn)
        .await?
        .into_iter()
        .filter(|p| p.expected_amount != contribution_type.penalty_amount)
        .map(|p| p.id)
        .collect();

    if stale.is_empty() {
        return Ok(0);
    }

    let result = penalty::Entity::update_many()
        .col_expr(
            penalty::Column::ExpectedAmount,
            Expr::value(contribution_type.penalty_amount),
        )
        .filter(penalty::Column::Id.is_in(stale))
        .exec(txn)
        .await?;
    debug!(
        "Repriced {} penalties of contribution {} to {}",
        result.rows_affected, contribution.id, contribution_type.penalty_amount
    );
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::find_balance;
    use crate::testing::helpers::*;
    use crate::testing::{date, setup_db};
    use model::entities::member::MemberStatus;
    use model::entities::payment::PaymentType;
    use model::entities::penalty::PenaltyOrigin;
    use sea_orm::{DatabaseConnection, QueryOrder};

    async fn months_of(db: &DatabaseConnection, contribution_id: i32) -> Vec<NaiveDate> {
        contribution_schedule::Entity::find()
            .filter(contribution_schedule::Column::ContributionId.eq(contribution_id))
            .order_by_asc(contribution_schedule::Column::Month)
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.month)
            .collect()
    }

    async fn quarterly_dues(
        db: &DatabaseConnection,
    ) -> (contribution::Model, contribution_type::Model) {
        let member = new_member(db, MemberStatus::Active).await.unwrap();
        let dues = new_contribution_type(
            db,
            "Monthly Dues",
            ContributionMode::Recurring,
            Some(date(2024, 1, 1)),
            Some(date(2024, 3, 1)),
            None,
        )
        .await
        .unwrap();
        let contribution = new_contribution(db, &member, &dues, Decimal::from(100), date(2024, 1, 1))
            .await
            .unwrap();
        for month in 1..=3 {
            new_schedule(db, &contribution, date(2024, month, 1), Decimal::ZERO)
                .await
                .unwrap();
        }
        (contribution, dues)
    }

    #[tokio::test]
    async fn test_moving_start_prunes_schedules() {
        let db = setup_db().await.unwrap();
        let (contribution, _) = quarterly_dues(&db).await;

        let update = ContributionUpdate {
            start_date: Some(date(2024, 2, 1)),
            ..Default::default()
        };
        let result = update_contribution_and_sync(&db, contribution.id, update)
            .await
            .unwrap();

        assert_eq!(result.contribution.start_date, date(2024, 2, 1));
        assert_eq!(months_of(&db, contribution.id).await, vec![date(2024, 2, 1)]);
    }

    #[tokio::test]
    async fn test_recurring_types_sync_a_single_month() {
        let db = setup_db().await.unwrap();
        let (contribution, _) = quarterly_dues(&db).await;

        let update = ContributionUpdate {
            amount: Some(Decimal::from(120)),
            ..Default::default()
        };
        update_contribution_and_sync(&db, contribution.id, update)
            .await
            .unwrap();

        let rows = contribution_schedule::Entity::find()
            .filter(contribution_schedule::Column::ContributionId.eq(contribution.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].month, date(2024, 1, 1));
        assert_eq!(rows[0].expected_amount, Decimal::from(120));
    }

    #[tokio::test]
    async fn test_one_time_window_spreads_amount() {
        let db = setup_db().await.unwrap();
        let member = new_member(&db, MemberStatus::Active).await.unwrap();
        let fund = new_contribution_type(
            &db,
            "Building Fund",
            ContributionMode::OneTimeWindow,
            Some(date(2024, 1, 1)),
            None,
            Some(3),
        )
        .await
        .unwrap();
        let contribution = new_contribution(&db, &member, &fund, Decimal::from(900), date(2024, 1, 1))
            .await
            .unwrap();
        let january = new_schedule(&db, &contribution, date(2024, 1, 1), Decimal::from(100))
            .await
            .unwrap();

        let update = ContributionUpdate {
            amount: Some(Decimal::from(1200)),
            ..Default::default()
        };
        update_contribution_and_sync(&db, contribution.id, update)
            .await
            .unwrap();

        let rows = contribution_schedule::Entity::find()
            .filter(contribution_schedule::Column::ContributionId.eq(contribution.id))
            .order_by_asc(contribution_schedule::Column::Month)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.expected_amount == Decimal::from(400)));
        // Payment state of the kept row survives
        assert_eq!(rows[0].id, january.id);
        assert_eq!(rows[0].paid_amount, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_balance_reflects_payments() {
        let db = setup_db().await.unwrap();
        let member = new_member(&db, MemberStatus::Active).await.unwrap();
        let fund = new_contribution_type(
            &db,
            "Building Fund",
            ContributionMode::OneTimeWindow,
            Some(date(2024, 1, 1)),
            None,
            Some(3),
        )
        .await
        .unwrap();
        let contribution = new_contribution(&db, &member, &fund, Decimal::from(1000), date(2024, 1, 1))
            .await
            .unwrap();
        let january = new_schedule(&db, &contribution, date(2024, 1, 1), Decimal::ZERO)
            .await
            .unwrap();
        new_payment(&db, &january, Decimal::from(300), PaymentType::Contribution, date(2024, 1, 3))
            .await
            .unwrap();
        new_payment(&db, &january, Decimal::from(150), PaymentType::Contribution, date(2024, 1, 9))
            .await
            .unwrap();

        let update = ContributionUpdate {
            amount: Some(Decimal::from(1200)),
            ..Default::default()
        };
        update_contribution_and_sync(&db, contribution.id, update)
            .await
            .unwrap();

        let stored = find_balance(&db, member.id, contribution.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount, Decimal::from(750));
    }

    #[tokio::test]
    async fn test_unresolved_penalties_are_repriced() {
        let db = setup_db().await.unwrap();
        let (contribution, _) = quarterly_dues(&db).await;
        // Type price is 50
        let stale = new_penalty(&db, &contribution, date(2024, 1, 1), Decimal::from(20), PenaltyOrigin::Automatically)
            .await
            .unwrap();
        let resolved = new_penalty(&db, &contribution, date(2024, 2, 1), Decimal::from(20), PenaltyOrigin::Manually)
            .await
            .unwrap();
        let mut resolved_update: penalty::ActiveModel = resolved.clone().into();
        resolved_update.resolved_at = Set(date(2024, 2, 10).and_hms_opt(9, 0, 0));
        resolved_update.update(&db).await.unwrap();

        update_contribution_and_sync(&db, contribution.id, ContributionUpdate::default())
            .await
            .unwrap();

        let stale = penalty::Entity::find_by_id(stale.id).one(&db).await.unwrap().unwrap();
        let resolved = penalty::Entity::find_by_id(resolved.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stale.expected_amount, Decimal::from(50));
        assert_eq!(resolved.expected_amount, Decimal::from(20));
    }

    #[tokio::test]
    async fn test_failure_rolls_back_every_step() {
        let db = setup_db().await.unwrap();
        let (contribution, _) = quarterly_dues(&db).await;

        // Step six cannot run without the penalties table
        db.execute_unprepared("DROP TABLE penalties;").await.unwrap();

        let update = ContributionUpdate {
            amount: Some(Decimal::from(250)),
            start_date: Some(date(2024, 2, 1)),
            ..Default::default()
        };
        let err = update_contribution_and_sync(&db, contribution.id, update)
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::Transaction(_)));

        assert_eq!(
            months_of(&db, contribution.id).await,
            vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]
        );
        let reloaded = contribution::Entity::find_by_id(contribution.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.amount, Decimal::from(100));
        assert_eq!(reloaded.start_date, date(2024, 1, 1));
        assert!(find_balance(&db, contribution.member_id, contribution.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_contribution_is_not_found() {
        let db = setup_db().await.unwrap();
        let err = update_contribution_and_sync(&db, 9999, ContributionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_one_time_window_without_period_is_rejected() {
        let db = setup_db().await.unwrap();
        let member = new_member(&db, MemberStatus::Active).await.unwrap();
        let fund = new_contribution_type(
            &db,
            "Building Fund",
            ContributionMode::OneTimeWindow,
            Some(date(2024, 1, 1)),
            None,
            None,
        )
        .await
        .unwrap();
        let contribution = new_contribution(&db, &member, &fund, Decimal::from(900), date(2024, 1, 1))
            .await
            .unwrap();

        let err = update_contribution_and_sync(&db, contribution.id, ContributionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::Validation(_)));
    }

    #[test]
    fn test_update_validation() {
        let negative = ContributionUpdate {
            amount: Some(Decimal::from(-1)),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let inverted = ContributionUpdate {
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        assert!(ContributionUpdate::default().validate().is_ok());
        assert!(ContributionUpdate::default().is_empty());
    }
}
