pub mod change;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod task;
pub mod types;
pub mod utils;

// Name of the ini section read from the config file
pub const CONFIG_SECTION: &str = "mirror";
