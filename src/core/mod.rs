pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod population;
pub mod row;
