// Domain layer - Core models (machines, sensor channels, time series)
pub mod machine;
pub mod sensor;
pub mod series;
