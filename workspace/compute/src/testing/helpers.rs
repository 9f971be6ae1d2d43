use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use model::entities::contribution_type::ContributionMode;
use model::entities::member::{MemberStatus, MemberType};
use model::entities::payment::PaymentType;
use model::entities::penalty::PenaltyOrigin;
use model::entities::{
    contribution, contribution_schedule, contribution_type, member, payment, penalty,
};

pub type Result<T> = std::result::Result<T, DbErr>;

pub async fn new_member(db: &DatabaseConnection, status: MemberStatus) -> Result<member::Model> {
    new_member_joined(db, status, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).await
}

pub async fn new_member_joined(
    db: &DatabaseConnection,
    status: MemberStatus,
    joined_date: NaiveDate,
) -> Result<member::Model> {
    static MEMBER_ID: AtomicU64 = AtomicU64::new(0);
    let current_id = MEMBER_ID.fetch_add(1, Ordering::SeqCst);

    member::ActiveModel {
        full_name: Set(format!("Member {}", current_id)),
        phone: Set(None),
        status: Set(status),
        member_type: Set(MemberType::Existing),
        joined_date: Set(joined_date),
        end_date: Set(None),
        is_principal: Set(true),
        spouse_id: Set(None),
        principal_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Creates a contribution type; `name` must be unique per database.
pub async fn new_contribution_type(
    db: &DatabaseConnection,
    name: &str,
    mode: ContributionMode,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    period_months: Option<i32>,
) -> Result<contribution_type::Model> {
    contribution_type::ActiveModel {
        name: Set(name.to_string()),
        mode: Set(mode),
        is_active: Set(true),
        start_date: Set(start_date),
        end_date: Set(end_date),
        period_months: Set(period_months),
        penalty_amount: Set(Decimal::from(50)),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_contribution(
    db: &DatabaseConnection,
    member: &member::Model,
    contribution_type: &contribution_type::Model,
    amount: Decimal,
    start_date: NaiveDate,
) -> Result<contribution::Model> {
    contribution::ActiveModel {
        member_id: Set(member.id),
        contribution_type_id: Set(contribution_type.id),
        amount: Set(amount),
        start_date: Set(start_date),
        end_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_schedule(
    db: &DatabaseConnection,
    contribution: &contribution::Model,
    month: NaiveDate,
    paid_amount: Decimal,
) -> Result<contribution_schedule::Model> {
    contribution_schedule::ActiveModel {
        member_id: Set(contribution.member_id),
        contribution_id: Set(contribution.id),
        month: Set(month),
        expected_amount: Set(contribution.amount),
        paid_amount: Set(paid_amount),
        is_paid: Set(paid_amount >= contribution.amount),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_payment(
    db: &DatabaseConnection,
    schedule: &contribution_schedule::Model,
    amount: Decimal,
    payment_type: PaymentType,
    payment_date: NaiveDate,
) -> Result<payment::Model> {
    payment::ActiveModel {
        member_id: Set(schedule.member_id),
        contribution_id: Set(Some(schedule.contribution_id)),
        schedule_id: Set(Some(schedule.id)),
        penalty_id: Set(None),
        paid_amount: Set(amount),
        payment_type: Set(payment_type),
        payment_date: Set(payment_date),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_penalty(
    db: &DatabaseConnection,
    contribution: &contribution::Model,
    missed_month: NaiveDate,
    expected_amount: Decimal,
    generated: PenaltyOrigin,
) -> Result<penalty::Model> {
    penalty::ActiveModel {
        member_id: Set(contribution.member_id),
        contribution_id: Set(Some(contribution.id)),
        schedule_id: Set(None),
        expected_amount: Set(expected_amount),
        paid_amount: Set(Decimal::ZERO),
        missed_month: Set(missed_month),
        penalty_type: Set("late_payment".to_string()),
        generated: Set(generated),
        waived: Set(false),
        resolved_at: Set(None),
        is_paid: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
}
