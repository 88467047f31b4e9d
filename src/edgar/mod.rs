// src/edgar/mod.rs
pub mod client;
pub mod models;

pub use client::EdgarClient;
pub use models::FetchConfig;
