pub mod initdb;
pub mod migrate_and_serve;
pub mod refresh;
pub mod serve;

pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use refresh::refresh_schedules;
pub use serve::serve;
