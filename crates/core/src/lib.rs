pub mod detection;
pub mod masking;
pub mod pipeline;
pub mod segmentation;
pub mod settings;
pub mod shared;
pub mod video;
