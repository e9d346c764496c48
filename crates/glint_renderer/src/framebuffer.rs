//! Shared pixel storage.
//!
//! Pixels are packed `0xAARRGGBB` words in atomics so render workers and
//! a display thread can touch the buffer concurrently without a lock.

use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque black.
pub const BLACK: u32 = 0xFF00_0000;
/// Opaque white.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Width x height grid of packed ARGB pixels. Row 0 is the top row.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<AtomicU32>,
}

impl FrameBuffer {
    /// Create a new buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = (0..width as usize * height as usize)
            .map(|_| AtomicU32::new(BLACK))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Write a pixel. Out-of-range coordinates are ignored.
    pub fn set(&self, x: u32, y: u32, argb: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i].store(argb, Ordering::Relaxed);
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i].load(Ordering::Relaxed))
    }

    /// Fill every pixel with `argb`.
    pub fn clear(&self, argb: u32) {
        for pixel in &self.pixels {
            pixel.store(argb, Ordering::Relaxed);
        }
    }

    /// Copy of all pixels in row-major order.
    pub fn snapshot(&self) -> Vec<u32> {
        self.pixels.iter().map(|p| p.load(Ordering::Relaxed)).collect()
    }

    /// Export as tightly packed RGBA8, the layout `image::RgbaImage` expects.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for argb in self.snapshot() {
            bytes.extend_from_slice(&[
                (argb >> 16) as u8,
                (argb >> 8) as u8,
                argb as u8,
                (argb >> 24) as u8,
            ]);
        }
        bytes
    }

    /// Draw a one pixel wide line. Endpoints may lie outside the buffer;
    /// the segment is clipped to the visible area first.
    pub fn draw_line(&self, start: (i32, i32), end: (i32, i32), argb: u32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let Some(((x0, y0), (x1, y1))) = self.clip(start, end) else {
            return;
        };

        // Bresenham
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            if x >= 0 && y >= 0 {
                self.set(x as u32, y as u32, argb);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Liang-Barsky clip against `[0, width-1] x [0, height-1]`.
    fn clip(&self, start: (i32, i32), end: (i32, i32)) -> Option<((i32, i32), (i32, i32))> {
        let (x0, y0) = (start.0 as f64, start.1 as f64);
        let (x1, y1) = (end.0 as f64, end.1 as f64);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;

        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        for (p, q) in [
            (-dx, x0),
            (dx, max_x - x0),
            (-dy, y0),
            (dy, max_y - y0),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return None;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return None;
                    }
                    t1 = t1.min(r);
                }
            }
        }

        let point = |t: f64| {
            (
                (x0 + t * dx).round().clamp(0.0, max_x) as i32,
                (y0 + t * dy).round().clamp(0.0, max_y) as i32,
            )
        };
        Some((point(t0), point(t1)))
    }
}
