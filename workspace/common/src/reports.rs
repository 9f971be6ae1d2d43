use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Short English label for a 1-based month number ("Jan".."Dec").
pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_LABELS.get(index as usize))
        .copied()
        .unwrap_or("")
}

/// Expected vs. paid contributions for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlySummary {
    /// Month label, "Jan".."Dec"
    pub name: String,
    /// Amount owed for the month, rounded to cents
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub expected: Decimal,
    /// Amount collected for the month, rounded to cents
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub paid: Decimal,
}

impl MonthlySummary {
    pub fn empty(month: u32) -> Self {
        Self {
            name: month_label(month).to_string(),
            expected: Decimal::ZERO,
            paid: Decimal::ZERO,
        }
    }
}

/// Automatic vs. manual penalty totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PenaltyMonthlySummary {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub auto_expected: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub auto_collected: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub manual_expected: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub manual_collected: Decimal,
}

impl PenaltyMonthlySummary {
    pub fn empty(month: u32) -> Self {
        Self {
            name: month_label(month).to_string(),
            auto_expected: Decimal::ZERO,
            auto_collected: Decimal::ZERO,
            manual_expected: Decimal::ZERO,
            manual_collected: Decimal::ZERO,
        }
    }
}

/// A KPI value with its change against the preceding month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricCard {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub value: Decimal,
    /// Percent change against the previous month; absent when that month is zero
    #[serde(
        rename = "percentageChange",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    #[schema(value_type = Option<f64>)]
    pub percentage_change: Option<Decimal>,
}

/// A contribution the materializer could not schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedContribution {
    pub contribution_id: i32,
    pub member_id: i32,
    pub reason: String,
}

/// An insert batch that failed; earlier batches stay committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchFailure {
    /// Zero-based batch index
    pub batch: usize,
    /// Number of rows the batch tried to insert
    pub rows: usize,
    pub message: String,
}

/// Outcome of one schedule materialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MaterializeReport {
    /// Schedule rows actually inserted
    pub created: u64,
    /// Contributions examined
    pub scanned_contributions: usize,
    /// Insert batches attempted
    pub batches: usize,
    pub skipped: Vec<SkippedContribution>,
    pub failed_batches: Vec<BatchFailure>,
}

impl MaterializeReport {
    /// True when every insert batch went through.
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut message = format!(
            "Created {} schedules across {} contributions",
            self.created, self.scanned_contributions
        );
        if !self.skipped.is_empty() {
            message.push_str(&format!(", skipped {}", self.skipped.len()));
        }
        if !self.failed_batches.is_empty() {
            message.push_str(&format!(", {} batches failed", self.failed_batches.len()));
        }
        message
    }
}
