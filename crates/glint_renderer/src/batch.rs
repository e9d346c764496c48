//! Randomized pixel batches.
//!
//! The frame is split into fixed-size groups of pixels drawn from a
//! shuffled order, so progressive updates fill the image evenly instead
//! of sweeping top to bottom.

use rand::seq::SliceRandom;
use rand::RngCore;

/// Default number of pixels per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A group of pixels rendered as one unit. Coordinates are `(i, j)` with
/// `j` counted from the bottom row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBatch {
    /// Position of this batch in the render order
    pub index: usize,
    pub pixels: Vec<(u32, u32)>,
}

impl PixelBatch {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Shuffle every pixel of a `width x height` image and chunk the result.
///
/// Every pixel appears in exactly one batch. Only the last batch may be
/// shorter than `batch_size`. A zero batch size is treated as one.
pub fn generate_batches(
    width: u32,
    height: u32,
    batch_size: usize,
    rng: &mut dyn RngCore,
) -> Vec<PixelBatch> {
    let mut pixels: Vec<(u32, u32)> = (0..height)
        .flat_map(|j| (0..width).map(move |i| (i, j)))
        .collect();
    pixels.shuffle(rng);

    pixels
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, chunk)| PixelBatch {
            index,
            pixels: chunk.to_vec(),
        })
        .collect()
}
