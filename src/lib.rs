pub mod airquality;
pub mod auth;
pub mod config;
pub mod countries;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod records;
pub mod services;
