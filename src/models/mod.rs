pub mod config;
pub mod drink;
