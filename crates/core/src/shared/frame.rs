use ndarray::{ArrayView3, ArrayViewMut3};

/// Number of color channels carried by every frame (packed RGB).
pub const FRAME_CHANNELS: usize = 3;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// `index` is the capture sequence number assigned by the capture stage.
/// Stages never share a mutable buffer: a stage that changes pixels
/// works on its own copy and hands the new frame downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * FRAME_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: [u8; 3], index: u64) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * FRAME_CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&color);
        }
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y as usize) * (self.width as usize) + x as usize) * FRAME_CHANNELS;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, FRAME_CHANNELS)
    }
}
