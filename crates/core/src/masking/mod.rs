pub mod background_masker;
pub mod face_privacy_masker;
pub mod gaussian;
mod roi;
