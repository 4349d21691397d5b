pub mod camera;
pub mod output_sink;
