//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async queries
//! that accept `&PgPool` as the first argument.

pub mod device_repo;
pub mod import_record_repo;
pub mod operator_repo;
pub mod user_repo;

pub use device_repo::DeviceRepo;
pub use import_record_repo::ImportRecordRepo;
pub use operator_repo::OperatorRepo;
pub use user_repo::UserRepo;
