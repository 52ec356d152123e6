// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod export;
pub mod static_catalog;
