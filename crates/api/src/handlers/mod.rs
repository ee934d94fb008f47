pub mod access;
pub mod dashboard;
pub mod devices;
pub mod importer;
pub mod operators;
pub mod users;
