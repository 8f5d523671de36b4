pub mod codec;
pub mod config;
pub mod device_client;
pub mod error;
pub mod http_client;
pub mod services;
pub mod types;
pub mod validation;
