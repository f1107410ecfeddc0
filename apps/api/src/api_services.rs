mod database;
mod redis;
mod sessions;
mod state_builder;

pub use database::connect_and_migrate;
pub use sessions::build_postgres_session_layer;
pub use state_builder::build_app_state;

#[cfg(test)]
pub(crate) use sessions::session_layer;
