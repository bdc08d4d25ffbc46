pub mod config;
pub mod logging;
pub mod msg;
pub mod session;
