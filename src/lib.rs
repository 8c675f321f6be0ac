pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod runner;
pub mod sinks;
