// Application layer - Use cases, session registry, and the series generator
pub mod error;
pub mod machine_catalog;
pub mod machine_service;
pub mod monitor_service;
pub mod series_generator;
pub mod session;
