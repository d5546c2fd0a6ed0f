//! CLI command implementations.

mod clear;
mod config;
mod doctor;
mod episodes;
mod nodes;
mod quickstart;
mod salesbot;
mod search;

pub use clear::run_clear;
pub use config::run_config;
pub use doctor::run_doctor;
pub use episodes::run_episodes;
pub use nodes::run_nodes;
pub use quickstart::run_quickstart;
pub use salesbot::run_salesbot;
pub use search::run_search;
