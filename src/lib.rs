// Library for tests to access modules

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod sample_repo;
pub mod sysinfo_repo;
pub mod version;
pub mod worker;
