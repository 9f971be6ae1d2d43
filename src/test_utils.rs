use crate::config::{AppSettings, build_cache};
use crate::router::create_router;
use crate::schemas::AppState;
use axum::Router;
use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use model::entities::contribution_type::ContributionMode;
use model::entities::member::{MemberStatus, MemberType};
use model::entities::penalty::PenaltyOrigin;
use model::entities::{contribution, contribution_schedule, contribution_type, member, penalty};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    let settings = AppSettings::default();
    let cache = build_cache(&settings.cache);

    AppState { db, cache, settings }
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is determined by the RUST_LOG environment variable,
/// defaulting to WARN if not set.
fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Create axum app for testing, returning the state so tests can seed rows
pub async fn setup_test_app() -> (Router, AppState) {
    let _guard = init_test_tracing();

    let state = setup_test_app_state().await;
    let router = create_router(state.clone());
    (router, state)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn seed_member(db: &DatabaseConnection, name: &str, status: MemberStatus) -> member::Model {
    member::ActiveModel {
        full_name: Set(name.to_string()),
        phone: Set(None),
        status: Set(status),
        member_type: Set(MemberType::New),
        joined_date: Set(date(2023, 1, 1)),
        end_date: Set(None),
        is_principal: Set(true),
        spouse_id: Set(None),
        principal_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create member")
}

pub async fn seed_type(
    db: &DatabaseConnection,
    name: &str,
    mode: ContributionMode,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    period_months: Option<i32>,
) -> contribution_type::Model {
    contribution_type::ActiveModel {
        name: Set(name.to_string()),
        mode: Set(mode),
        is_active: Set(true),
        start_date: Set(Some(start_date)),
        end_date: Set(end_date),
        period_months: Set(period_months),
        penalty_amount: Set(Decimal::from(50)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create contribution type")
}

pub async fn seed_contribution(
    db: &DatabaseConnection,
    member: &member::Model,
    contribution_type: &contribution_type::Model,
    amount: Decimal,
) -> contribution::Model {
    contribution::ActiveModel {
        member_id: Set(member.id),
        contribution_type_id: Set(contribution_type.id),
        amount: Set(amount),
        start_date: Set(contribution_type.start_date.unwrap_or(date(2024, 1, 1))),
        end_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create contribution")
}

pub async fn seed_schedule(
    db: &DatabaseConnection,
    contribution: &contribution::Model,
    month: NaiveDate,
) -> contribution_schedule::Model {
    contribution_schedule::ActiveModel {
        member_id: Set(contribution.member_id),
        contribution_id: Set(contribution.id),
        month: Set(month),
        expected_amount: Set(contribution.amount),
        paid_amount: Set(Decimal::ZERO),
        is_paid: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create schedule")
}

pub async fn seed_penalty(
    db: &DatabaseConnection,
    member: &member::Model,
    expected_amount: Decimal,
    missed_month: NaiveDate,
) -> penalty::Model {
    penalty::ActiveModel {
        member_id: Set(member.id),
        contribution_id: Set(None),
        schedule_id: Set(None),
        expected_amount: Set(expected_amount),
        paid_amount: Set(Decimal::ZERO),
        missed_month: Set(missed_month),
        penalty_type: Set("Late payment".to_string()),
        generated: Set(PenaltyOrigin::Manually),
        waived: Set(false),
        resolved_at: Set(None),
        is_paid: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create penalty")
}
