/// Error type returned by external collaborators (camera, detector,
/// segmenter, output sink). Boxed so any backend error can cross threads.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
