pub mod band_pipeline;
pub mod headless;
pub mod resources;
