pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use commands::AppState;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
