use common::display_amount;
use model::entities::payment::PaymentType;
use model::entities::{balance, contribution, payment};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set};
use tracing::{debug, instrument};

use crate::error::Result;

/// Total of contribution payments recorded against a contribution.
/// Penalty settlements are not part of the contribution balance.
pub async fn total_paid<C: ConnectionTrait>(db: &C, contribution_id: i32) -> Result<Decimal> {
    let amounts: Vec<Decimal> = payment::Entity::find()
        .select_only()
        .column(payment::Column::PaidAmount)
        .filter(payment::Column::ContributionId.eq(contribution_id))
        .filter(payment::Column::PaymentType.eq(PaymentType::Contribution))
        .into_tuple()
        .all(db)
        .await?;

    Ok(amounts.into_iter().sum())
}

/// Recomputes the outstanding balance of a contribution as its amount minus
/// everything paid so far, and upserts it on the (member, contribution) key.
#[instrument(skip(db, contribution), fields(contribution_id = contribution.id, member_id = contribution.member_id))]
pub async fn recompute_balance<C: ConnectionTrait>(
    db: &C,
    contribution: &contribution::Model,
) -> Result<Decimal> {
    let paid = total_paid(db, contribution.id).await?;
    let outstanding = contribution.amount - paid;

    balance::Entity::insert(balance::ActiveModel {
        member_id: Set(contribution.member_id),
        contribution_id: Set(contribution.id),
        amount: Set(outstanding),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([balance::Column::MemberId, balance::Column::ContributionId])
            .update_column(balance::Column::Amount)
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    debug!(
        "Balance for contribution {} is {} (owed {}, paid {})",
        contribution.id,
        display_amount(outstanding),
        display_amount(contribution.amount),
        display_amount(paid)
    );
    Ok(outstanding)
}

/// Current stored balance for a (member, contribution) pair.
pub async fn find_balance<C: ConnectionTrait>(
    db: &C,
    member_id: i32,
    contribution_id: i32,
) -> Result<Option<balance::Model>> {
    Ok(balance::Entity::find()
        .filter(balance::Column::MemberId.eq(member_id))
        .filter(balance::Column::ContributionId.eq(contribution_id))
        .one(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::helpers::*;
    use crate::testing::{date, setup_db};
    use model::entities::contribution_type::ContributionMode;
    use model::entities::member::MemberStatus;

    #[tokio::test]
    async fn test_balance_is_amount_minus_payments() {
        let db = setup_db().await.unwrap();
        let member = new_member(&db, MemberStatus::Active).await.unwrap();
        let dues = new_contribution_type(
            &db,
            "Building Fund",
            ContributionMode::OneTimeWindow,
            Some(date(2024, 1, 1)),
            None,
            Some(3),
        )
        .await
        .unwrap();
        let contribution = new_contribution(&db, &member, &dues, Decimal::from(1200), date(2024, 1, 1))
            .await
            .unwrap();
        let january = new_schedule(&db, &contribution, date(2024, 1, 1), Decimal::ZERO)
            .await
            .unwrap();
        new_payment(&db, &january, Decimal::from(300), PaymentType::Contribution, date(2024, 1, 5))
            .await
            .unwrap();
        new_payment(&db, &january, Decimal::from(150), PaymentType::Contribution, date(2024, 1, 20))
            .await
            .unwrap();
        // Penalty settlements do not reduce the contribution balance
        new_payment(&db, &january, Decimal::from(50), PaymentType::Penalty, date(2024, 1, 20))
            .await
            .unwrap();

        let outstanding = recompute_balance(&db, &contribution).await.unwrap();
        assert_eq!(outstanding, Decimal::from(750));

        // Upsert keeps a single row
        let outstanding = recompute_balance(&db, &contribution).await.unwrap();
        assert_eq!(outstanding, Decimal::from(750));
        assert_eq!(balance::Entity::find().all(&db).await.unwrap().len(), 1);

        let stored = find_balance(&db, member.id, contribution.id).await.unwrap().unwrap();
        assert_eq!(stored.amount, Decimal::from(750));
    }
}
