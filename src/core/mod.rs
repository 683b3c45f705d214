pub mod animation;
pub mod api_client;
pub mod commands;
pub mod errors;
pub mod file_validator;
pub mod models;
pub mod results_view;
pub mod score;
pub mod service;
pub mod session;
pub mod settings_store;
pub mod upload;
