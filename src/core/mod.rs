pub mod api_client;
pub mod commands;
pub mod errors;
pub mod form;
pub mod models;
pub mod render;
pub mod service;
pub mod settings_store;
pub mod terminal;

#[cfg(test)]
mod test_support;
