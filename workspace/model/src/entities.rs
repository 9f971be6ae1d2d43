//! Root of all SeaORM entity modules for the association ledger.
//! Members enroll in contribution types; each enrollment is expanded into
//! monthly schedule rows, settled by payments, and may carry penalties and
//! a running balance.

pub mod balance;
pub mod contribution;
pub mod contribution_schedule;
pub mod contribution_type;
pub mod member;
pub mod payment;
pub mod penalty;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::balance::Entity as Balance;
    pub use super::contribution::Entity as Contribution;
    pub use super::contribution_schedule::Entity as ContributionSchedule;
    pub use super::contribution_type::Entity as ContributionType;
    pub use super::member::Entity as Member;
    pub use super::payment::Entity as Payment;
    pub use super::penalty::Entity as Penalty;
}
