use ndarray::Array2;

use crate::shared::constants::FOREGROUND_THRESHOLD;

/// Per-pixel foreground probability in `[0, 1]`, shaped `(height, width)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    probabilities: Array2<f32>,
}

impl Segmentation {
    pub fn new(probabilities: Array2<f32>) -> Self {
        Self { probabilities }
    }

    /// Builds a mask from row-major probabilities.
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        Array2::from_shape_vec((height as usize, width as usize), data)
            .ok()
            .map(Self::new)
    }

    /// Every pixel has probability `value`.
    pub fn uniform(width: u32, height: u32, value: f32) -> Self {
        Self::new(Array2::from_elem((height as usize, width as usize), value))
    }

    pub fn width(&self) -> u32 {
        self.probabilities.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.probabilities.nrows() as u32
    }

    pub fn probabilities(&self) -> &Array2<f32> {
        &self.probabilities
    }

    /// Binary foreground mask: probability strictly above the threshold.
    pub fn foreground_mask(&self) -> Array2<bool> {
        self.probabilities.mapv(|p| p > FOREGROUND_THRESHOLD)
    }
}
