pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod health;
pub mod jira;
pub mod manager;
pub mod model;
pub mod tools;
pub mod util;
pub mod validate;
