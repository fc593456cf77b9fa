pub mod client;
pub mod fetcher;
pub mod normalize;
pub mod query;
pub mod types;
