pub mod classify;
pub mod config;
pub mod fetch;
pub mod join;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod stats;
pub mod topology;
