pub mod config;
pub mod error;
pub mod gpu;
pub mod plotter;
pub mod projection;
pub mod sample;
pub mod vertex_builder;

pub mod cli;
