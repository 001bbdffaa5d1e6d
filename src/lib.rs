pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod error;
pub mod location;
pub mod model;
pub mod models;
pub mod notify;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;
