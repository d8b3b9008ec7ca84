use std::time::Instant;

use ndarray::ArrayView3;

use crate::shared::bbox::BoundingBox;

/// A single camera frame: contiguous RGB bytes in row-major order plus the
/// moment it was read from the device.
///
/// Frames are ephemeral. They live in a queue slot until consumed or
/// displaced; only sample crops extracted from them are kept around.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            captured_at: Instant::now(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `bbox` (clamped to the frame) into a new
    /// frame. The crop inherits this frame's index and capture time. A box
    /// with no overlap yields an empty zero-by-zero crop.
    pub fn crop(&self, bbox: &BoundingBox) -> Frame {
        let b = bbox.clamped(self.width, self.height);
        if b.width() == 0 || b.height() == 0 {
            return Frame {
                data: Vec::new(),
                width: 0,
                height: 0,
                channels: self.channels,
                index: self.index,
                captured_at: self.captured_at,
            };
        }
        let w = b.width() as usize;
        let h = b.height() as usize;
        let ch = self.channels as usize;
        let stride = self.width as usize * ch;

        let mut data = Vec::with_capacity(w * h * ch);
        for row in b.top as usize..(b.top as usize + h) {
            let start = row * stride + b.left as usize * ch;
            data.extend_from_slice(&self.data[start..start + w * ch]);
        }

        Frame {
            data,
            width: w as u32,
            height: h as u32,
            channels: self.channels,
            index: self.index,
            captured_at: self.captured_at,
        }
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
