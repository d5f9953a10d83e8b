pub mod cli;
pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod web;


pub use config::Config;
pub use store::Store;
