use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Encodes PNG frames into an H.264 video at a fixed frame rate
///
/// Frames are piped to `ffmpeg` in order. Returns `Ok(false)` without
/// starting ffmpeg when there are no frames.
pub async fn assemble_video(
    frames: &[Vec<u8>],
    frame_rate: u32,
    output: &Path,
) -> anyhow::Result<bool> {
    if frames.is_empty() {
        return Ok(false);
    }

    let mut child = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-nostats"])
        .args(["-f", "image2pipe", "-framerate"])
        .arg(frame_rate.to_string())
        .args(["-i", "-"])
        .args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("Failed to start ffmpeg")?;

    let mut stdin = child.stdin.take().context("ffmpeg stdin unavailable")?;
    for (index, frame) in frames.iter().enumerate() {
        stdin
            .write_all(frame)
            .await
            .with_context(|| format!("Failed to stream frame {} to ffmpeg", index))?;
    }
    drop(stdin);

    let result = child
        .wait_with_output()
        .await
        .context("Failed to wait for ffmpeg")?;

    if !result.status.success() {
        bail!(
            "ffmpeg exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    tracing::info!(
        "Encoded {} frames at {} fps into {}",
        frames.len(),
        frame_rate,
        output.display()
    );
    Ok(true)
}
