pub mod image_convert;
pub mod image_file_camera;
pub mod image_sequence_sink;
