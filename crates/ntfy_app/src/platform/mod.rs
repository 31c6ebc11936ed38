mod app;
mod config;
mod console;
mod coordinator;
mod effects;
mod logging;
mod observer;
mod persistence;

pub use app::run_app;
