pub mod face_detection;
pub mod face_detector;
