use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Who raised the penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PenaltyOrigin {
    #[sea_orm(string_value = "automatically")]
    Automatically,
    #[sea_orm(string_value = "manually")]
    Manually,
}

/// A charge assessed against a member for a missed obligation.
/// Penalties are assessed elsewhere; this system re-prices, waives and collects them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "penalties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub contribution_id: Option<i32>,
    pub schedule_id: Option<i32>,
    /// Current price of the penalty.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub expected_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Decimal,
    pub missed_month: NaiveDate,
    pub penalty_type: String,
    pub generated: PenaltyOrigin,
    #[sea_orm(default_value = "false")]
    pub waived: bool,
    /// Set once the penalty is fully paid or waived.
    pub resolved_at: Option<NaiveDateTime>,
    #[sea_orm(default_value = "false")]
    pub is_paid: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contribution::Entity",
        from = "Column::ContributionId",
        to = "super::contribution::Column::Id",
        on_delete = "SetNull"
    )]
    Contribution,
    #[sea_orm(
        belongs_to = "super::contribution_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::contribution_schedule::Column::Id",
        on_delete = "SetNull"
    )]
    ContributionSchedule,
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contribution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}
