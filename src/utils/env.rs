// src/utils/env.rs
use log::{debug, info};

/// Loads a `.env` file from the working directory (or a parent) if one exists.
/// Variables already set in the process environment take precedence.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}
