pub mod api;
pub mod banner;
pub mod breeds;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
