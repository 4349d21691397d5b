use std::cell::RefCell;

use super::roi;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::{Frame, FRAME_CHANNELS};

/// Kernels at or above this size are applied on a downscaled copy.
const DOWNSCALE_KERNEL_STEP: usize = 50;

/// Normalized 1D Gaussian weights with sigma `kernel_size / 6`.
///
/// `kernel_size` must be odd and >= 1.
fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size % 2 == 1);
    let sigma = kernel_size as f64 / 6.0;
    let center = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| (-(i as f64 - center).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / total) as f32).collect()
}

/// Weighted sum around `pos` of a line of `len` samples, edges replicated.
fn convolve(kernel: &[f32], len: usize, pos: usize, sample: impl Fn(usize) -> f32) -> f32 {
    let half = kernel.len() / 2;
    kernel
        .iter()
        .enumerate()
        .map(|(k, &w)| sample((pos + k).saturating_sub(half).min(len - 1)) * w)
        .sum()
}

/// Rows then columns over a packed RGB buffer.
fn separable_blur(
    data: &mut [u8],
    width: usize,
    height: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let ch = FRAME_CHANNELS;
    temp.clear();
    temp.resize(width * height * ch, 0.0);

    for y in 0..height {
        let row = y * width * ch;
        for x in 0..width {
            for c in 0..ch {
                temp[row + x * ch + c] =
                    convolve(kernel, width, x, |sx| data[row + sx * ch + c] as f32);
            }
        }
    }
    for y in 0..height {
        for x in 0..width {
            for c in 0..ch {
                let v = convolve(kernel, height, y, |sy| temp[(sy * width + x) * ch + c]);
                data[(y * width + x) * ch + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Box-filter shrink by `factor`; partial blocks at the right and bottom
/// edges are dropped.
fn shrink(data: &[u8], width: usize, height: usize, factor: usize) -> (Vec<u8>, usize, usize) {
    let ch = FRAME_CHANNELS;
    let (out_w, out_h) = (width / factor, height / factor);
    let area = (factor * factor) as u32;
    let mut out = Vec::with_capacity(out_w * out_h * ch);
    for by in 0..out_h {
        for bx in 0..out_w {
            let mut acc = [0u32; FRAME_CHANNELS];
            for y in by * factor..(by + 1) * factor {
                let start = (y * width + bx * factor) * ch;
                for px in data[start..start + factor * ch].chunks_exact(ch) {
                    for (a, &v) in acc.iter_mut().zip(px) {
                        *a += v as u32;
                    }
                }
            }
            out.extend(acc.iter().map(|&a| (a / area) as u8));
        }
    }
    (out, out_w, out_h)
}

/// For each of `to` output samples: the two neighbouring source samples
/// and the weight of the second.
fn sample_positions(from: usize, to: usize) -> Vec<(usize, usize, f32)> {
    let step = (from as f32 - 1.0) / (to as f32 - 1.0).max(1.0);
    (0..to)
        .map(|i| {
            let pos = i as f32 * step;
            let lo = (pos.floor() as usize).min(from - 1);
            (lo, (lo + 1).min(from - 1), pos - lo as f32)
        })
        .collect()
}

/// Bilinear stretch to `out_w x out_h`.
fn stretch(data: &[u8], width: usize, height: usize, out_w: usize, out_h: usize) -> Vec<u8> {
    let ch = FRAME_CHANNELS;
    let cols = sample_positions(width, out_w);
    let rows = sample_positions(height, out_h);
    let mut out = Vec::with_capacity(out_w * out_h * ch);
    for &(y0, y1, fy) in &rows {
        for &(x0, x1, fx) in &cols {
            for c in 0..ch {
                let at = |x: usize, y: usize| data[(y * width + x) * ch + c] as f32;
                let top = at(x0, y0) + (at(x1, y0) - at(x0, y0)) * fx;
                let bottom = at(x0, y1) + (at(x1, y1) - at(x0, y1)) * fx;
                out.push((top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    out
}

/// Reusable Gaussian blur with a fixed kernel size.
///
/// Large kernels are applied to a downscaled copy and upscaled back, so the
/// stored kernel never exceeds about twice `DOWNSCALE_KERNEL_STEP` taps.
/// Holds scratch buffers, so one instance belongs to one thread.
pub struct GaussianBlur {
    size: usize,
    /// Weights at `1 / scale` resolution.
    kernel: Vec<f32>,
    scale: usize,
    temp: RefCell<Vec<f32>>,
}

impl GaussianBlur {
    /// `kernel_size` is forced odd.
    pub fn new(kernel_size: usize) -> Self {
        let size = kernel_size | 1;
        let scale = (size / DOWNSCALE_KERNEL_STEP).max(1);
        Self {
            size,
            kernel: gaussian_kernel_1d((size / scale) | 1),
            scale,
            temp: RefCell::new(Vec::new()),
        }
    }

    pub fn kernel_size(&self) -> usize {
        self.size
    }

    /// Blurs a packed RGB buffer in place.
    pub fn blur_buffer(&self, data: &mut [u8], width: usize, height: usize) {
        let mut temp = self.temp.borrow_mut();
        // Buffers too small to shrink take the reduced kernel directly; it
        // still spans them.
        if self.scale == 1 || width < self.scale * 2 || height < self.scale * 2 {
            separable_blur(data, width, height, &self.kernel, &mut temp);
            return;
        }
        let (mut small, sw, sh) = shrink(data, width, height, self.scale);
        separable_blur(&mut small, sw, sh, &self.kernel, &mut temp);
        data.copy_from_slice(&stretch(&small, sw, sh, width, height));
    }

    /// Blurred pixels of `rect`, computed only from pixels inside it.
    pub fn blur_rect(&self, frame: &Frame, rect: BoundingBox) -> Vec<u8> {
        let mut pixels = roi::extract(frame, rect);
        self.blur_buffer(&mut pixels, rect.width() as usize, rect.height() as usize);
        pixels
    }

    /// Whole-frame blur returned as a new frame.
    pub fn blur_frame(&self, frame: &Frame) -> Frame {
        let mut out = frame.clone();
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        self.blur_buffer(out.data_mut(), w, h);
        out
    }
}
