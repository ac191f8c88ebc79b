pub mod alert;
pub mod config;
pub mod constants;
pub mod detection;
pub mod logging;
pub mod monitor;
pub mod source;
pub mod transport;
pub mod vision;
