pub mod dataset;
pub mod fetcher;
pub mod merge;
pub mod planner;
pub mod record;
pub mod source;
pub mod sync;
pub mod timestamps;
pub mod validate;
