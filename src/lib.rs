pub mod analyzers;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod scenario;
pub mod stats;
