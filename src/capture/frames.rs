use std::fs;
use std::path::{Path, PathBuf};

use super::{CaptureError, CaptureSink};

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = ".png";

/// File name of the frame at `index`
pub fn frame_file_name(index: u64) -> String {
    format!("{}{}{}", FRAME_PREFIX, index, FRAME_EXTENSION)
}

fn frame_index(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXTENSION)?
        .parse()
        .ok()
}

/// Sink writing `frame_<n>.png` files into one directory
#[derive(Debug, Clone)]
pub struct FrameDirectory {
    dir: PathBuf,
}

impl FrameDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Removes frames left by a previous run and recreates the directory
    pub fn reset(&self) -> Result<(), CaptureError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(frame_file_name(index))
    }
}

impl CaptureSink for FrameDirectory {
    fn capture(&mut self, frame_index: u64, png: &[u8]) -> Result<(), CaptureError> {
        if png.is_empty() {
            return Err(CaptureError::EmptyFrame { index: frame_index });
        }
        fs::write(self.frame_path(frame_index), png)?;
        tracing::debug!("Saved frame {}", frame_index);
        Ok(())
    }
}

/// Reads every frame in `dir`, ordered by numeric index
///
/// Files that do not follow the `frame_<n>.png` naming are ignored, so
/// `frame_10.png` sorts after `frame_9.png`. A missing directory yields no
/// frames.
pub fn load_frames(dir: &Path) -> Result<Vec<Vec<u8>>, CaptureError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut indexed = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(index) = name.to_str().and_then(frame_index) {
            indexed.push((index, entry.path()));
        }
    }
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .into_iter()
        .map(|(_, path)| fs::read(path).map_err(CaptureError::from))
        .collect()
}
