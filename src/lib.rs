// Library exports for Chronicle
// This allows integration tests and external code to use Chronicle modules

pub mod auth;
pub mod config;
pub mod csrf;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod forms;
pub mod routes;
pub mod state;
