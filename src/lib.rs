pub mod analytics;
pub mod arguments;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod errors;
pub mod fetchers;
pub mod logger;
pub mod metadata;
pub mod paths;
pub mod report;
pub mod rpc;
pub mod token_list;
pub mod types;
