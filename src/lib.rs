pub mod api_client;
pub mod config;
pub mod constants;
pub mod controllers;
pub mod credential_store;
pub mod data_types;
pub mod errors;
pub mod live_updates;
pub mod notifications;
pub mod route_guard;
pub mod session;
pub mod widgets;

#[cfg(test)]
pub(crate) mod testing;
