//! Optional screen capture of a scan
//!
//! When recording is enabled the fetcher takes a screenshot of every page it
//! loads. Frames are handed to a [`CaptureSink`] as they arrive and, once the
//! scan finishes, the frames directory is encoded into a video.

mod frames;
mod video;

pub use frames::{frame_file_name, load_frames, FrameDirectory};
pub use video::assemble_video;

use thiserror::Error;

/// Errors raised while storing frames
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Frame I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame {index} is empty")]
    EmptyFrame { index: u64 },
}

/// Destination for captured frames
///
/// Capture is best effort: the coordinator logs and counts a failed frame
/// and carries on with the scan.
pub trait CaptureSink: Send {
    fn capture(&mut self, frame_index: u64, png: &[u8]) -> Result<(), CaptureError>;
}
