pub mod compare;
pub mod config;
pub mod dataset;
pub mod db;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod report;
