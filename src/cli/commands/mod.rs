//! CLI command implementations

pub mod clear;
pub mod config;
pub mod fetch;
pub mod prompt;
pub mod status;

pub use clear::execute as clear;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use prompt::execute as prompt;
pub use status::execute as status;
