pub mod segmentation;
pub mod segmenter;
