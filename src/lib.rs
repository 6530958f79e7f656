pub mod analytics;
pub mod config;
pub mod data;
pub mod monitoring;
pub mod presentation;
pub mod request;
