use std::fs;
use std::path::{Path, PathBuf};

use image::{ColorType, ImageFormat};

use crate::shared::frame::Frame;
use crate::tracking::domain::sample_store::SampleStore;

/// Writes each completed capture session as a directory of ordered JPEGs
/// (`face_000.jpg`, `face_001.jpg`, ...) under a base directory, named by
/// the session id. The bundle later feeds model (re)training.
pub struct ImageDirSampleStore {
    base_dir: PathBuf,
}

impl ImageDirSampleStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn write_jpeg(path: &Path, sample: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let color = match sample.channels() {
            1 => ColorType::L8,
            3 => ColorType::Rgb8,
            other => return Err(format!("unsupported channel count: {other}").into()),
        };
        image::save_buffer_with_format(
            path,
            sample.data(),
            sample.width(),
            sample.height(),
            color,
            ImageFormat::Jpeg,
        )?;
        Ok(())
    }
}

impl SampleStore for ImageDirSampleStore {
    fn store(
        &mut self,
        session_id: &str,
        samples: &[Frame],
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let session_dir = self.base_dir.join(session_id);
        fs::create_dir_all(&session_dir)?;

        for (idx, sample) in samples.iter().enumerate() {
            let path = session_dir.join(format!("face_{idx:03}.jpg"));
            Self::write_jpeg(&path, sample)?;
        }

        Ok(session_dir)
    }
}
