//! Row models.
//!
//! Each submodule holds a `FromRow` struct matching one table plus a
//! `TryFrom` conversion into the corresponding `fiscal_core` type. Enum
//! columns are stored as `TEXT` and parsed on the way out.

pub mod device;
pub mod import_record;
pub mod operator;
pub mod user;
