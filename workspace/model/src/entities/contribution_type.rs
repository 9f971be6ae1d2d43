use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Name of the contribution type whose schedules are billed through penalties.
pub const PENALTY_TYPE_NAME: &str = "Penalty";

/// How contributions of a type are laid out over calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
pub enum ContributionMode {
    /// Every month between `start_date` and `end_date`.
    #[sea_orm(string_value = "Recurring")]
    Recurring,
    /// `period_months` months starting at `start_date`.
    #[sea_orm(string_value = "OneTimeWindow")]
    OneTimeWindow,
    /// Every month from `start_date` on, materialized up to a rolling horizon.
    #[sea_orm(string_value = "OpenEndedRecurring")]
    OpenEndedRecurring,
}

/// A category of recurring obligation, e.g. "Monthly Dues".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contribution_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub mode: ContributionMode,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    /// Required for `Recurring`.
    pub end_date: Option<NaiveDate>,
    /// Required for `OneTimeWindow`.
    pub period_months: Option<i32>,
    /// Flat price of a penalty for a missed month of this type.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub penalty_amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contribution::Entity")]
    Contribution,
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contribution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Penalty-type schedules are left out of expected totals.
    pub fn is_penalty_type(&self) -> bool {
        is_penalty_type_name(&self.name)
    }
}

pub fn is_penalty_type_name(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(PENALTY_TYPE_NAME)
}
