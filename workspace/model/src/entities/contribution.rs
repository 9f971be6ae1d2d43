use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A member's enrollment in a contribution type.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub contribution_type_id: i32,
    /// Amount owed. For one-time windows this is the total spread over the window.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Member,
    #[sea_orm(
        belongs_to = "super::contribution_type::Entity",
        from = "Column::ContributionTypeId",
        to = "super::contribution_type::Column::Id"
    )]
    ContributionType,
    #[sea_orm(has_many = "super::contribution_schedule::Entity")]
    ContributionSchedule,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::contribution_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContributionType.def()
    }
}

impl Related<super::contribution_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContributionSchedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
