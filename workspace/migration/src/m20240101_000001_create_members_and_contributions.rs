use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{contribution, contribution_type, member};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create members table
        manager
            .create_table(
                Table::create()
                    .table(Member::table())
                    .if_not_exists()
                    .col(pk_auto(Member::column(member::Column::Id)))
                    .col(string(Member::column(member::Column::FullName)))
                    .col(string_null(Member::column(member::Column::Phone)))
                    .col(string(Member::column(member::Column::Status)).string_len(20))
                    .col(string(Member::column(member::Column::MemberType)).string_len(20))
                    .col(date(Member::column(member::Column::JoinedDate)))
                    .col(date_null(Member::column(member::Column::EndDate)))
                    .col(boolean(Member::column(member::Column::IsPrincipal)).default(false))
                    .col(integer_null(Member::column(member::Column::SpouseId)))
                    .col(integer_null(Member::column(member::Column::PrincipalId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_spouse")
                            .from(Member::table(), Member::column(member::Column::SpouseId))
                            .to(Member::table(), Member::column(member::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_principal")
                            .from(Member::table(), Member::column(member::Column::PrincipalId))
                            .to(Member::table(), Member::column(member::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create contribution_types table
        manager
            .create_table(
                Table::create()
                    .table(ContributionType::table())
                    .if_not_exists()
                    .col(pk_auto(ContributionType::column(contribution_type::Column::Id)))
                    .col(string(ContributionType::column(contribution_type::Column::Name)).unique_key())
                    .col(string(ContributionType::column(contribution_type::Column::Mode)).string_len(30))
                    .col(boolean(ContributionType::column(contribution_type::Column::IsActive)).default(true))
                    .col(date_null(ContributionType::column(contribution_type::Column::StartDate)))
                    .col(date_null(ContributionType::column(contribution_type::Column::EndDate)))
                    .col(integer_null(ContributionType::column(contribution_type::Column::PeriodMonths)))
                    .col(
                        decimal(ContributionType::column(contribution_type::Column::PenaltyAmount))
                            .decimal_len(16, 4),
                    )
                    .to_owned(),
            )
            .await?;

        // Create contributions table
        manager
            .create_table(
                Table::create()
                    .table(Contribution::table())
                    .if_not_exists()
                    .col(pk_auto(Contribution::column(contribution::Column::Id)))
                    .col(integer(Contribution::column(contribution::Column::MemberId)))
                    .col(integer(Contribution::column(contribution::Column::ContributionTypeId)))
                    .col(
                        decimal(Contribution::column(contribution::Column::Amount))
                            .decimal_len(16, 4),
                    )
                    .col(date(Contribution::column(contribution::Column::StartDate)))
                    .col(date_null(Contribution::column(contribution::Column::EndDate)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contributions_member")
                            .from(Contribution::table(), Contribution::column(contribution::Column::MemberId))
                            .to(Member::table(), Member::column(member::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contributions_contribution_type")
                            .from(
                                Contribution::table(),
                                Contribution::column(contribution::Column::ContributionTypeId),
                            )
                            .to(
                                ContributionType::table(),
                                ContributionType::column(contribution_type::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contributions_member_id")
                    .table(Contribution::table())
                    .col(Contribution::column(contribution::Column::MemberId))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contribution::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContributionType::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Member::table()).to_owned())
            .await?;

        Ok(())
    }
}
