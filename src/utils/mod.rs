pub mod constants;
pub mod env;
pub mod logging;
pub mod pipeline_config;
pub mod progress_config;
pub mod signature;
