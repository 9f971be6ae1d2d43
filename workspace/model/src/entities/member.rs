use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// Membership status. Only `Active` members owe contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MemberStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Left")]
    Left,
    #[sea_orm(string_value = "Deceased")]
    Deceased,
}

/// Whether the member joined after the association started keeping records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MemberType {
    #[sea_orm(string_value = "New")]
    New,
    #[sea_orm(string_value = "Existing")]
    Existing,
}

/// A person registered with the association.
/// Members of one household point at their head through `principal_id`;
/// the head itself has `is_principal` set and no `principal_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    pub phone: Option<String>,
    pub status: MemberStatus,
    pub member_type: MemberType,
    pub joined_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[sea_orm(default_value = "false")]
    pub is_principal: bool,
    /// Spouse within the same household.
    pub spouse_id: Option<i32>,
    /// Household head this member depends on.
    pub principal_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::SpouseId", to = "Column::Id")]
    Spouse,
    #[sea_orm(belongs_to = "Entity", from = "Column::PrincipalId", to = "Column::Id")]
    Principal,
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
    /// Loads the spouse record, if one is linked and still present.
    pub async fn spouse<C: ConnectionTrait>(&self, db: &C) -> Result<Option<Model>, DbErr> {
        match self.spouse_id {
            Some(spouse_id) => Entity::find_by_id(spouse_id).one(db).await,
            None => Ok(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}
