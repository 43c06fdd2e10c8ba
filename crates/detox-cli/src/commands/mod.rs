pub mod bypass;
pub mod complete;
pub mod config;
pub mod onboard;
pub mod settings;
pub mod stats;
pub mod status;
pub mod watch;
