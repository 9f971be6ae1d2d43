//! Recording payments and waiving penalties.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model::entities::payment::PaymentType;
use model::entities::{contribution, contribution_schedule, payment, penalty};
use rust_decimal::Decimal;
use serde::Deserialize;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use tracing::{debug, info, instrument, trace};

use crate::atomic::finish;
use crate::balance::recompute_balance;
use crate::error::{ComputeError, Result};

/// A payment against exactly one schedule month or one penalty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPayment {
    pub schedule_id: Option<i32>,
    pub penalty_id: Option<i32>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
}

enum PaymentTarget {
    Schedule(i32),
    Penalty(i32),
}

impl NewPayment {
    fn target(&self) -> Result<PaymentTarget> {
        if self.amount <= Decimal::ZERO {
            return Err(ComputeError::Validation(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }
        match (self.schedule_id, self.penalty_id) {
            (Some(schedule_id), None) => Ok(PaymentTarget::Schedule(schedule_id)),
            (None, Some(penalty_id)) => Ok(PaymentTarget::Penalty(penalty_id)),
            _ => Err(ComputeError::Validation(
                "a payment needs exactly one of schedule_id or penalty_id".to_string(),
            )),
        }
    }
}

/// Records a payment and updates the schedule or penalty it settles.
///
/// Schedule payments also refresh the contribution balance. Everything
/// happens in one transaction.
#[instrument(skip(db))]
pub async fn record_payment<C>(db: &C, new_payment: NewPayment) -> Result<payment::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    trace!("Entering record_payment");
    let target = new_payment.target()?;

    let txn = db.begin().await?;
    let result = match target {
        PaymentTarget::Schedule(schedule_id) => pay_schedule(&txn, schedule_id, &new_payment).await,
        PaymentTarget::Penalty(penalty_id) => pay_penalty(&txn, penalty_id, &new_payment).await,
    };
    let payment = finish(txn, result, "payment").await?;

    info!(
        "Recorded {:?} payment {} of {} for member {}",
        payment.payment_type,
        payment.id,
        common::display_amount(payment.paid_amount),
        payment.member_id
    );
    Ok(payment)
}

async fn pay_schedule<C: ConnectionTrait>(
    txn: &C,
    schedule_id: i32,
    new_payment: &NewPayment,
) -> Result<payment::Model> {
    let schedule = contribution_schedule::Entity::find_by_id(schedule_id)
        .one(txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("ContributionSchedule", schedule_id))?;
    let contribution = contribution::Entity::find_by_id(schedule.contribution_id)
        .one(txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Contribution", schedule.contribution_id))?;

    let paid_amount = schedule.paid_amount + new_payment.amount;
    let is_paid = paid_amount >= schedule.expected_amount;
    debug!(
        "Schedule {} paid {} of {}",
        schedule.id, paid_amount, schedule.expected_amount
    );

    let member_id = schedule.member_id;
    let mut active: contribution_schedule::ActiveModel = schedule.into();
    active.paid_amount = Set(paid_amount);
    active.is_paid = Set(is_paid);
    active.update(txn).await?;

    let payment = payment::ActiveModel {
        member_id: Set(member_id),
        contribution_id: Set(Some(contribution.id)),
        schedule_id: Set(Some(schedule_id)),
        penalty_id: Set(None),
        paid_amount: Set(new_payment.amount),
        payment_type: Set(PaymentType::Contribution),
        payment_date: Set(new_payment.payment_date),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    recompute_balance(txn, &contribution).await?;
    Ok(payment)
}

async fn pay_penalty<C: ConnectionTrait>(
    txn: &C,
    penalty_id: i32,
    new_payment: &NewPayment,
) -> Result<payment::Model> {
    let penalty = find_penalty(txn, penalty_id).await?;
    if penalty.waived {
        return Err(ComputeError::Validation(format!(
            "penalty {} has been waived",
            penalty_id
        )));
    }
    if penalty.is_paid {
        return Err(ComputeError::Validation(format!(
            "penalty {} is already paid",
            penalty_id
        )));
    }

    let paid_amount = penalty.paid_amount + new_payment.amount;
    let is_paid = paid_amount >= penalty.expected_amount;
    let (member_id, contribution_id, schedule_id) =
        (penalty.member_id, penalty.contribution_id, penalty.schedule_id);

    let mut active: penalty::ActiveModel = penalty.into();
    active.paid_amount = Set(paid_amount);
    active.is_paid = Set(is_paid);
    if is_paid {
        active.resolved_at = Set(Some(new_payment.payment_date.and_time(NaiveTime::MIN)));
    }
    active.update(txn).await?;

    let payment = payment::ActiveModel {
        member_id: Set(member_id),
        contribution_id: Set(contribution_id),
        schedule_id: Set(schedule_id),
        penalty_id: Set(Some(penalty_id)),
        paid_amount: Set(new_payment.amount),
        payment_type: Set(PaymentType::Penalty),
        payment_date: Set(new_payment.payment_date),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(payment)
}

async fn find_penalty<C: ConnectionTrait>(db: &C, penalty_id: i32) -> Result<penalty::Model> {
    penalty::Entity::find_by_id(penalty_id)
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::not_found("Penalty", penalty_id))
}

/// Waives a penalty, resolving it without payment.
#[instrument(skip(db))]
pub async fn waive_penalty<C>(db: &C, penalty_id: i32, now: NaiveDateTime) -> Result<penalty::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    trace!("Entering waive_penalty");
    let txn = db.begin().await?;
    let result = waive(&txn, penalty_id, now).await;
    let waived = finish(txn, result, "penalty waiver").await?;

    info!("Waived penalty {} of member {}", waived.id, waived.member_id);
    Ok(waived)
}

async fn waive<C: ConnectionTrait>(txn: &C, penalty_id: i32, now: NaiveDateTime) -> Result<penalty::Model> {
    let penalty = find_penalty(txn, penalty_id).await?;
    if penalty.is_paid {
        return Err(ComputeError::Validation(format!(
            "penalty {} is already paid and cannot be waived",
            penalty_id
        )));
    }
    if penalty.waived {
        return Err(ComputeError::Validation(format!(
            "penalty {} is already waived",
            penalty_id
        )));
    }

    let mut active: penalty::ActiveModel = penalty.into();
    active.waived = Set(true);
    active.resolved_at = Set(Some(now));
    Ok(active.update(txn).await?)
}
