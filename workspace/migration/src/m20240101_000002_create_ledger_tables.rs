use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{
    balance, contribution, contribution_schedule, member, payment, penalty,
};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create contribution_schedules table
        manager
            .create_table(
                Table::create()
                    .table(ContributionSchedule::table())
                    .if_not_exists()
                    .col(pk_auto(ContributionSchedule::column(contribution_schedule::Column::Id)))
                    .col(integer(ContributionSchedule::column(contribution_schedule::Column::MemberId)))
                    .col(integer(ContributionSchedule::column(
                        contribution_schedule::Column::ContributionId,
                    )))
                    .col(date(ContributionSchedule::column(contribution_schedule::Column::Month)))
                    .col(
                        decimal(ContributionSchedule::column(
                            contribution_schedule::Column::ExpectedAmount,
                        ))
                        .decimal_len(16, 4),
                    )
                    .col(
                        decimal(ContributionSchedule::column(contribution_schedule::Column::PaidAmount))
                            .decimal_len(16, 4)
                            .default(0),
                    )
                    .col(
                        boolean(ContributionSchedule::column(contribution_schedule::Column::IsPaid))
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contribution_schedules_contribution")
                            .from(
                                ContributionSchedule::table(),
                                ContributionSchedule::column(contribution_schedule::Column::ContributionId),
                            )
                            .to(Contribution::table(), Contribution::column(contribution::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contribution_schedules_member")
                            .from(
                                ContributionSchedule::table(),
                                ContributionSchedule::column(contribution_schedule::Column::MemberId),
                            )
                            .to(Member::table(), Member::column(member::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One schedule row per (member, contribution, month)
        manager
            .create_index(
                Index::create()
                    .name("idx_contribution_schedules_member_contribution_month")
                    .table(ContributionSchedule::table())
                    .col(ContributionSchedule::column(contribution_schedule::Column::MemberId))
                    .col(ContributionSchedule::column(contribution_schedule::Column::ContributionId))
                    .col(ContributionSchedule::column(contribution_schedule::Column::Month))
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Create penalties table
        manager
            .create_table(
                Table::create()
                    .table(Penalty::table())
                    .if_not_exists()
                    .col(pk_auto(Penalty::column(penalty::Column::Id)))
                    .col(integer(Penalty::column(penalty::Column::MemberId)))
                    .col(integer_null(Penalty::column(penalty::Column::ContributionId)))
                    .col(integer_null(Penalty::column(penalty::Column::ScheduleId)))
                    .col(decimal(Penalty::column(penalty::Column::ExpectedAmount)).decimal_len(16, 4))
                    .col(
                        decimal(Penalty::column(penalty::Column::PaidAmount))
                            .decimal_len(16, 4)
                            .default(0),
                    )
                    .col(date(Penalty::column(penalty::Column::MissedMonth)))
                    .col(string(Penalty::column(penalty::Column::PenaltyType)))
                    .col(string(Penalty::column(penalty::Column::Generated)).string_len(20))
                    .col(boolean(Penalty::column(penalty::Column::Waived)).default(false))
                    .col(date_time_null(Penalty::column(penalty::Column::ResolvedAt)))
                    .col(boolean(Penalty::column(penalty::Column::IsPaid)).default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_penalties_member")
                            .from(Penalty::table(), Penalty::column(penalty::Column::MemberId))
                            .to(Member::table(), Member::column(member::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_penalties_contribution")
                            .from(Penalty::table(), Penalty::column(penalty::Column::ContributionId))
                            .to(Contribution::table(), Contribution::column(contribution::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_penalties_contribution_schedule")
                            .from(Penalty::table(), Penalty::column(penalty::Column::ScheduleId))
                            .to(
                                ContributionSchedule::table(),
                                ContributionSchedule::column(contribution_schedule::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payment::table())
                    .if_not_exists()
                    .col(pk_auto(Payment::column(payment::Column::Id)))
                    .col(integer(Payment::column(payment::Column::MemberId)))
                    .col(integer_null(Payment::column(payment::Column::ContributionId)))
                    .col(integer_null(Payment::column(payment::Column::ScheduleId)))
                    .col(integer_null(Payment::column(payment::Column::PenaltyId)))
                    .col(decimal(Payment::column(payment::Column::PaidAmount)).decimal_len(16, 4))
                    .col(string(Payment::column(payment::Column::PaymentType)).string_len(20))
                    .col(date(Payment::column(payment::Column::PaymentDate)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_member")
                            .from(Payment::table(), Payment::column(payment::Column::MemberId))
                            .to(Member::table(), Member::column(member::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_contribution_schedule")
                            .from(Payment::table(), Payment::column(payment::Column::ScheduleId))
                            .to(
                                ContributionSchedule::table(),
                                ContributionSchedule::column(contribution_schedule::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_penalty")
                            .from(Payment::table(), Payment::column(payment::Column::PenaltyId))
                            .to(Penalty::table(), Penalty::column(penalty::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_contribution_id")
                    .table(Payment::table())
                    .col(Payment::column(payment::Column::ContributionId))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Create balances table
        manager
            .create_table(
                Table::create()
                    .table(Balance::table())
                    .if_not_exists()
                    .col(pk_auto(Balance::column(balance::Column::Id)))
                    .col(integer(Balance::column(balance::Column::MemberId)))
                    .col(integer(Balance::column(balance::Column::ContributionId)))
                    .col(decimal(Balance::column(balance::Column::Amount)).decimal_len(16, 4))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_balances_contribution")
                            .from(Balance::table(), Balance::column(balance::Column::ContributionId))
                            .to(Contribution::table(), Contribution::column(contribution::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Balances are upserted on this key
        manager
            .create_index(
                Index::create()
                    .name("idx_balances_member_contribution")
                    .table(Balance::table())
                    .col(Balance::column(balance::Column::MemberId))
                    .col(Balance::column(balance::Column::ContributionId))
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Balance::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payment::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Penalty::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContributionSchedule::table()).to_owned())
            .await?;

        Ok(())
    }
}
