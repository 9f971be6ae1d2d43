//! Household head succession.

use model::entities::member::{self, MemberStatus};
use model::entities::{balance, contribution, contribution_schedule};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, instrument, trace};

use crate::atomic::finish;
use crate::error::{ComputeError, Result};

/// Result of moving the principal role to a spouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalTransfer {
    pub previous_principal: member::Model,
    pub new_principal: member::Model,
    pub dependents_moved: u64,
    pub contributions_moved: u64,
    pub schedules_moved: u64,
}

/// Hands the household of a departed principal to their spouse.
///
/// The member must be a principal whose status is `Deceased`, `Left` or
/// `Inactive`, and the spouse must be `Active`. Dependents, contributions,
/// schedule rows and balances move to the spouse; payments and penalties stay
/// with the member who incurred them.
#[instrument(skip(db))]
pub async fn transfer_principal<C>(db: &C, member_id: i32) -> Result<PrincipalTransfer>
where
    C: ConnectionTrait + TransactionTrait,
{
    trace!("Entering transfer_principal");
    let txn = db.begin().await?;
    let result = transfer(&txn, member_id).await;
    let transfer = finish(txn, result, "principal transfer").await?;

    info!(
        "Principal of household moved from member {} to member {} ({} dependents, {} contributions)",
        transfer.previous_principal.id,
        transfer.new_principal.id,
        transfer.dependents_moved,
        transfer.contributions_moved
    );
    Ok(transfer)
}

async fn transfer<C: ConnectionTrait>(txn: &C, member_id: i32) -> Result<PrincipalTransfer> {
    let principal = member::Entity::find_by_id(member_id)
        .one(txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Member", member_id))?;

    if !principal.is_principal {
        return Err(ComputeError::Validation(format!(
            "member {} is not a household principal",
            member_id
        )));
    }
    if principal.status == MemberStatus::Active {
        return Err(ComputeError::Validation(format!(
            "member {} is still active",
            member_id
        )));
    }

    let spouse = principal.spouse(txn).await?.ok_or_else(|| {
        ComputeError::Validation(format!("member {} has no spouse to take over", member_id))
    })?;
    if !spouse.is_active() {
        return Err(ComputeError::Validation(format!(
            "spouse {} of member {} is not active",
            spouse.id, member_id
        )));
    }
    let spouse_id = spouse.id;

    let mut previous: member::ActiveModel = principal.into();
    previous.is_principal = Set(false);
    previous.principal_id = Set(Some(spouse_id));
    let previous_principal = previous.update(txn).await?;

    let mut successor: member::ActiveModel = spouse.into();
    successor.is_principal = Set(true);
    successor.principal_id = Set(None);
    let new_principal = successor.update(txn).await?;

    let dependents_moved = member::Entity::update_many()
        .col_expr(member::Column::PrincipalId, Expr::value(spouse_id))
        .filter(member::Column::PrincipalId.eq(member_id))
        .filter(member::Column::Id.ne(spouse_id))
        .filter(member::Column::Id.ne(member_id))
        .exec(txn)
        .await?
        .rows_affected;

    let contributions_moved = contribution::Entity::update_many()
        .col_expr(contribution::Column::MemberId, Expr::value(spouse_id))
        .filter(contribution::Column::MemberId.eq(member_id))
        .exec(txn)
        .await?
        .rows_affected;

    let schedules_moved = contribution_schedule::Entity::update_many()
        .col_expr(contribution_schedule::Column::MemberId, Expr::value(spouse_id))
        .filter(contribution_schedule::Column::MemberId.eq(member_id))
        .exec(txn)
        .await?
        .rows_affected;

    balance::Entity::update_many()
        .col_expr(balance::Column::MemberId, Expr::value(spouse_id))
        .filter(balance::Column::MemberId.eq(member_id))
        .exec(txn)
        .await?;

    Ok(PrincipalTransfer {
        previous_principal,
        new_principal,
        dependents_moved,
        contributions_moved,
        schedules_moved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{find_balance, recompute_balance};
    use crate::testing::helpers::*;
    use crate::testing::{date, setup_db};
    use model::entities::contribution_type::ContributionMode;
    use rust_decimal::Decimal;
    use sea_orm::DatabaseConnection;

    /// Head, spouse and one child; the head carries one contribution.
    async fn household(
        db: &DatabaseConnection,
        head_status: MemberStatus,
        spouse_status: MemberStatus,
    ) -> (member::Model, member::Model, member::Model, contribution::Model) {
        let head = new_member(db, head_status).await.unwrap();
        let spouse = new_member(db, spouse_status).await.unwrap();
        let child = new_member(db, MemberStatus::Active).await.unwrap();

        let mut link: member::ActiveModel = head.into();
        link.spouse_id = Set(Some(spouse.id));
        let head = link.update(db).await.unwrap();

        let mut link: member::ActiveModel = spouse.into();
        link.is_principal = Set(false);
        link.spouse_id = Set(Some(head.id));
        link.principal_id = Set(Some(head.id));
        let spouse = link.update(db).await.unwrap();

        let mut link: member::ActiveModel = child.into();
        link.is_principal = Set(false);
        link.principal_id = Set(Some(head.id));
        let child = link.update(db).await.unwrap();

        let dues = new_contribution_type(
            db,
            "Monthly Dues",
            ContributionMode::Recurring,
            Some(date(2024, 1, 1)),
            Some(date(2024, 12, 1)),
            None,
        )
        .await
        .unwrap();
        let contribution = new_contribution(db, &head, &dues, Decimal::from(100), date(2024, 1, 1))
            .await
            .unwrap();
        new_schedule(db, &contribution, date(2024, 1, 1), Decimal::ZERO)
            .await
            .unwrap();
        recompute_balance(db, &contribution).await.unwrap();

        (head, spouse, child, contribution)
    }

    #[tokio::test]
    async fn test_deceased_principal_hands_over_to_spouse() {
        let db = setup_db().await.unwrap();
        let (head, spouse, child, contribution) =
            household(&db, MemberStatus::Deceased, MemberStatus::Active).await;

        let transfer = transfer_principal(&db, head.id).await.unwrap();
        assert!(!transfer.previous_principal.is_principal);
        assert!(transfer.new_principal.is_principal);
        assert_eq!(transfer.new_principal.principal_id, None);
        assert_eq!(transfer.dependents_moved, 1);
        assert_eq!(transfer.contributions_moved, 1);
        assert_eq!(transfer.schedules_moved, 1);

        let child = member::Entity::find_by_id(child.id).one(&db).await.unwrap().unwrap();
        assert_eq!(child.principal_id, Some(spouse.id));

        let moved = contribution::Entity::find_by_id(contribution.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.member_id, spouse.id);

        let schedules = contribution_schedule::Entity::find()
            .filter(contribution_schedule::Column::ContributionId.eq(contribution.id))
            .all(&db)
            .await
            .unwrap();
        assert!(schedules.iter().all(|row| row.member_id == spouse.id));
        assert!(find_balance(&db, spouse.id, contribution.id).await.unwrap().is_some());
        assert!(find_balance(&db, head.id, contribution.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_principal_is_rejected() {
        let db = setup_db().await.unwrap();
        let (head, _, _, contribution) =
            household(&db, MemberStatus::Active, MemberStatus::Active).await;

        let err = transfer_principal(&db, head.id).await.unwrap_err();
        assert!(matches!(err, ComputeError::Validation(_)));

        let unchanged = contribution::Entity::find_by_id(contribution.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.member_id, head.id);
    }

    #[tokio::test]
    async fn test_inactive_spouse_is_rejected() {
        let db = setup_db().await.unwrap();
        let (head, _, _, _) = household(&db, MemberStatus::Left, MemberStatus::Inactive).await;

        let err = transfer_principal(&db, head.id).await.unwrap_err();
        assert!(matches!(err, ComputeError::Validation(_)));

        let head = member::Entity::find_by_id(head.id).one(&db).await.unwrap().unwrap();
        assert!(head.is_principal);
    }

    #[tokio::test]
    async fn test_unknown_member_is_not_found() {
        let db = setup_db().await.unwrap();
        let err = transfer_principal(&db, 4242).await.unwrap_err();
        assert!(matches!(err, ComputeError::NotFound(_)));
    }
}
