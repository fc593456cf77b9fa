pub mod config;
pub mod dashboard;
pub mod db;
pub mod export;
pub mod indexer;
pub mod pipeline;
pub mod report;
