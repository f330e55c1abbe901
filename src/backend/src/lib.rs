pub mod config;
pub mod device_client;
pub mod http_client;
pub mod runtime;
pub mod socket_client;
