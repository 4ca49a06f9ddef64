pub mod builder;
pub mod config;
pub mod errors;
pub mod generator;
pub mod parser;
pub mod render;
pub mod types;
pub mod verify;
