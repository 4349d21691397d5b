//! Rectangular pixel-region copy and fill helpers.
//!
//! Every function expects a box already clamped to the frame and non-empty.

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::{Frame, FRAME_CHANNELS};

fn span(rect: BoundingBox) -> (usize, usize, usize, usize) {
    (
        rect.x1 as usize,
        rect.y1 as usize,
        rect.width() as usize,
        rect.height() as usize,
    )
}

/// Copies the pixels under `rect` into a tightly packed buffer.
pub fn extract(frame: &Frame, rect: BoundingBox) -> Vec<u8> {
    let (x, y, w, h) = span(rect);
    let fw = frame.width() as usize;
    let row_len = w * FRAME_CHANNELS;
    let data = frame.data();
    let mut roi = Vec::with_capacity(row_len * h);
    for row in y..y + h {
        let start = (row * fw + x) * FRAME_CHANNELS;
        roi.extend_from_slice(&data[start..start + row_len]);
    }
    roi
}

/// Writes a packed buffer produced by [`extract`] back under `rect`.
pub fn write_back(frame: &mut Frame, rect: BoundingBox, roi: &[u8]) {
    let (x, y, w, h) = span(rect);
    let fw = frame.width() as usize;
    let row_len = w * FRAME_CHANNELS;
    let data = frame.data_mut();
    for (i, row) in (y..y + h).enumerate() {
        let dst = (row * fw + x) * FRAME_CHANNELS;
        data[dst..dst + row_len].copy_from_slice(&roi[i * row_len..(i + 1) * row_len]);
    }
}

pub fn fill(frame: &mut Frame, rect: BoundingBox, color: [u8; 3]) {
    let (x, y, w, h) = span(rect);
    let fw = frame.width() as usize;
    let data = frame.data_mut();
    for row in y..y + h {
        let start = (row * fw + x) * FRAME_CHANNELS;
        for px in data[start..start + w * FRAME_CHANNELS].chunks_exact_mut(FRAME_CHANNELS) {
            px.copy_from_slice(&color);
        }
    }
}
