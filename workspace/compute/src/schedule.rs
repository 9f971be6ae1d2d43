//! Schedule materialization for all active members.
//!
//! The materializer expands every active enrollment into one schedule row per
//! owed month and inserts only the months that are missing. It is additive:
//! existing rows, balances and penalties are never touched, so running it
//! twice on unchanged data inserts nothing the second time.
//!
//! Inserts are flushed in batches of [`ScheduleSettings::batch_size`]. Each
//! batch is a single statement that commits on its own, so an interrupted run
//! keeps all the batches that already went through.

use std::collections::HashSet;

use chrono::NaiveDate;
use common::{BatchFailure, MaterializeReport, SkippedContribution};
use model::entities::member::{self, MemberStatus};
use model::entities::{contribution, contribution_schedule, contribution_type};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::Result;
use crate::recurrence::{DEFAULT_HORIZON_MONTHS, contribution_months, expected_amount_per_month};

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Tuning knobs for schedule generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Rows per insert statement.
    pub batch_size: usize,
    /// Months ahead of today that open-ended contributions are materialized.
    pub horizon_months: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }
}

/// An enrollment with its owning contribution type.
pub type Enrollment = (contribution::Model, contribution_type::Model);

/// Generates missing schedule rows for every active enrollment.
pub struct ScheduleMaterializer {
    settings: ScheduleSettings,
    /// The date used as "today" for open-ended horizons.
    today: NaiveDate,
}

impl ScheduleMaterializer {
    pub fn new(settings: ScheduleSettings, today: NaiveDate) -> Self {
        Self { settings, today }
    }

    /// Creates a materializer with default settings.
    pub fn new_with_today(today: NaiveDate) -> Self {
        Self::new(ScheduleSettings::default(), today)
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Inserts every missing schedule row for active members and active types.
    ///
    /// Contributions whose window cannot be computed are skipped and listed in
    /// the report. A failed insert batch is recorded and the run continues with
    /// the next batch; the report's `created` count only covers rows that were
    /// actually written.
    #[instrument(skip(self, db), fields(today = %self.today, batch_size = self.settings.batch_size))]
    pub async fn generate_schedules_for_all_active_members<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<MaterializeReport> {
        trace!("Entering generate_schedules_for_all_active_members");
        let enrollments = active_enrollments(db).await?;
        info!("Materializing schedules for {} active enrollments", enrollments.len());

        let batch_size = self.settings.batch_size.max(1);
        let mut report = MaterializeReport {
            scanned_contributions: enrollments.len(),
            ..Default::default()
        };
        let mut pending: Vec<contribution_schedule::ActiveModel> = Vec::new();

        for (contribution, contribution_type) in &enrollments {
            let months = match contribution_months(
                contribution,
                contribution_type,
                self.today,
                self.settings.horizon_months,
            ) {
                Ok(months) => months,
                Err(reason) => {
                    warn!(
                        "Skipping contribution {} of member {}: {}",
                        contribution.id, contribution.member_id, reason
                    );
                    report.skipped.push(SkippedContribution {
                        contribution_id: contribution.id,
                        member_id: contribution.member_id,
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };

            let existing = existing_months(db, contribution, &months).await?;
            let expected_amount = expected_amount_per_month(contribution, contribution_type);
            let missing: Vec<NaiveDate> = months
                .into_iter()
                .filter(|month| !existing.contains(month))
                .collect();
            debug!(
                "Contribution {} has {} existing and {} missing months",
                contribution.id,
                existing.len(),
                missing.len()
            );

            pending.extend(
                missing
                    .into_iter()
                    .map(|month| new_schedule_row(contribution, month, expected_amount)),
            );

            while pending.len() >= batch_size {
                let batch: Vec<_> = pending.drain(..batch_size).collect();
                flush_batch(db, batch, &mut report).await;
            }
        }

        if !pending.is_empty() {
            flush_batch(db, pending, &mut report).await;
        }

        if report.is_complete() {
            info!("{}", report.summary());
        } else {
            error!("{}", report.summary());
        }
        Ok(report)
    }
}

/// Enrollments of `Active` members in active contribution types, in id order.
pub async fn active_enrollments<C: ConnectionTrait>(db: &C) -> Result<Vec<Enrollment>> {
    let rows = contribution::Entity::find()
        .join(
            sea_orm::JoinType::InnerJoin,
            contribution::Relation::Member.def(),
        )
        .find_also_related(contribution_type::Entity)
        .filter(member::Column::Status.eq(MemberStatus::Active))
        .filter(contribution_type::Column::IsActive.eq(true))
        .order_by_asc(contribution::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(contribution, contribution_type)| {
            contribution_type.map(|contribution_type| (contribution, contribution_type))
        })
        .collect())
}

/// Months of `candidates` that already have a schedule row, in a single query.
async fn existing_months<C: ConnectionTrait>(
    db: &C,
    contribution: &contribution::Model,
    candidates: &[NaiveDate],
) -> std::result::Result<HashSet<NaiveDate>, DbErr> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let months: Vec<NaiveDate> = contribution_schedule::Entity::find()
        .select_only()
        .column(contribution_schedule::Column::Month)
        .filter(contribution_schedule::Column::MemberId.eq(contribution.member_id))
        .filter(contribution_schedule::Column::ContributionId.eq(contribution.id))
        .filter(contribution_schedule::Column::Month.is_in(candidates.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(months.into_iter().collect())
}

fn new_schedule_row(
    contribution: &contribution::Model,
    month: NaiveDate,
    expected_amount: Decimal,
) -> contribution_schedule::ActiveModel {
    contribution_schedule::ActiveModel {
        member_id: Set(contribution.member_id),
        contribution_id: Set(contribution.id),
        month: Set(month),
        expected_amount: Set(expected_amount),
        paid_amount: Set(Decimal::ZERO),
        is_paid: Set(false),
        ..Default::default()
    }
}

/// Inserts one batch, recording the outcome in the report.
async fn flush_batch<C: ConnectionTrait>(
    db: &C,
    batch: Vec<contribution_schedule::ActiveModel>,
    report: &mut MaterializeReport,
) {
    let index = report.batches;
    let rows = batch.len();
    report.batches += 1;

    let result = contribution_schedule::Entity::insert_many(batch)
        .on_conflict(
            OnConflict::columns([
                contribution_schedule::Column::MemberId,
                contribution_schedule::Column::ContributionId,
                contribution_schedule::Column::Month,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(inserted) => {
            debug!("Batch {} inserted {} of {} rows", index, inserted, rows);
            report.created += inserted;
        }
        Err(e) => {
            error!("Batch {} of {} rows failed: {}", index, rows, e);
            report.failed_batches.push(BatchFailure {
                batch: index,
                rows,
                message: e.to_string(),
            });
        }
    }
}
