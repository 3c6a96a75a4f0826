//! Core translation adapter module

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod languages;
pub mod models;
