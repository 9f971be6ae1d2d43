use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Distinguishes penalty settlements from regular contribution payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentType {
    #[sea_orm(string_value = "contribution")]
    Contribution,
    #[sea_orm(string_value = "penalty")]
    Penalty,
}

/// Money received from a member against a schedule month or a penalty.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub contribution_id: Option<i32>,
    pub schedule_id: Option<i32>,
    pub penalty_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_date: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contribution_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::contribution_schedule::Column::Id",
        on_delete = "SetNull"
    )]
    ContributionSchedule,
    #[sea_orm(
        belongs_to = "super::penalty::Entity",
        from = "Column::PenaltyId",
        to = "super::penalty::Column::Id",
        on_delete = "SetNull"
    )]
    Penalty,
}

impl Related<super::contribution_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContributionSchedule.def()
    }
}

impl Related<super::penalty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Penalty.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
