pub mod contributions;
pub mod health;
pub mod members;
pub mod metrics;
pub mod payments;
pub mod penalties;
pub mod reports;
pub mod schedules;
