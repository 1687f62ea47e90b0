pub mod app;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod model;
pub mod output;
pub mod paginator;
pub mod render;
pub mod utils;
pub mod view;

#[cfg(test)]
mod tests;
