//! Owned 8-bit grayscale pixel buffer.

/// Row-major grayscale image, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayFrame {
    /// Wrap raw luma bytes. Returns `None` if `data` does not hold exactly
    /// `width * height` pixels.
    pub fn from_luma(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Convert RGBA bytes with Rec.601 luma weights; alpha is ignored.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Option<Self> {
        if rgba.len() != width * height * 4 {
            return None;
        }
        let data = rgba
            .chunks_exact(4)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Uniform image filled with one intensity.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Fill the axis-aligned rectangle `[x0, x1) x [y0, y1)`, clipped to the
    /// image.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, value: u8) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        for y in y0.min(y1)..y1 {
            for x in x0.min(x1)..x1 {
                self.set(x, y, value);
            }
        }
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_luma_checks_length() {
        assert!(GrayFrame::from_luma(2, 2, vec![0; 4]).is_some());
        assert!(GrayFrame::from_luma(2, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn test_from_rgba_luma_weights() {
        let rgba = [
            255, 255, 255, 0, // white, alpha ignored
            0, 0, 0, 255, // black
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
        ];
        let frame = GrayFrame::from_rgba(2, 2, &rgba).unwrap();
        assert_eq!(frame.get(0, 0), 255);
        assert_eq!(frame.get(1, 0), 0);
        assert_eq!(frame.get(0, 1), 76);
        assert_eq!(frame.get(1, 1), 150);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = GrayFrame::filled(4, 3, 0);
        frame.fill_rect(2, 1, 10, 10, 9);
        assert_eq!(frame.get(1, 1), 0);
        assert_eq!(frame.get(3, 2), 9);
        assert_eq!(frame.row(0), &[0, 0, 0, 0]);
        assert_eq!(frame.as_slice().iter().filter(|&&v| v == 9).count(), 4);
    }
}
