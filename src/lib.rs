pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod loader;
pub mod mock;
pub mod models;
pub mod observer;
pub mod ui;
