pub mod dataset;
pub mod partition;
pub mod store;
