pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

#[cfg(test)]
pub mod test_utils;
