pub mod static_face_detector;
