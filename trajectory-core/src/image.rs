//! Raw pixel buffers.
//!
//! Memories store frames as they come from the environment and convert them to
//! `f32` only when a single record is read, so converted copies never stay in
//! memory.
use ndarray::ArrayD;

/// A frame as produced by the environment, e.g. `[height, width, channels]`.
pub type RawImage = ArrayD<u8>;

/// A frame converted for training consumers.
pub type ImageTensor = ArrayD<f32>;

/// Converts raw pixels to `f32` without rescaling.
pub fn to_tensor(image: &RawImage) -> ImageTensor {
    image.mapv(f32::from)
}
