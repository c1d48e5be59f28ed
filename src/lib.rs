#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod models;
pub mod session;
pub mod signin;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
