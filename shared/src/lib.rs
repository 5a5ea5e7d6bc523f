pub mod pagination;
pub mod responses;
pub mod shutdown;
pub mod telemetry;
pub mod types;
