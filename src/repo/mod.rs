pub mod config;
pub mod proxy_file;
