use std::{
    ffi::OsString,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, Stdio},
    thread::JoinHandle,
};

use crate::{
    foundation::{
        core::{Frame, PixelLayout},
        error::{PanoError, PanoResult},
    },
    source::{FrameSource, SourceInfo},
};

/// Decodes a video file by piping `rgb24` raw frames out of an `ffmpeg` child process.
///
/// Requires `ffprobe` and `ffmpeg` on `PATH`.
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: SourceInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    frame_len: usize,
}

impl std::fmt::Debug for FfmpegFrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegFrameSource")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl FfmpegFrameSource {
    /// Probe `path` and start decoding its first video stream.
    #[tracing::instrument(level = "debug")]
    pub fn open(path: &Path) -> PanoResult<Self> {
        if !path.is_file() {
            return Err(PanoError::frame_source(format!(
                "video file '{}' does not exist",
                path.display()
            )));
        }
        let info = probe_video(path)?;
        let frame_len = info.width as usize * info.height as usize * PixelLayout::Rgb8.channels();
        if frame_len == 0 {
            return Err(PanoError::frame_source(format!(
                "'{}' reports an empty frame size {}x{}",
                path.display(),
                info.width,
                info.height
            )));
        }

        let mut child = Command::new("ffmpeg")
            .args(decode_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PanoError::frame_source(format!("failed to run ffmpeg: {e}")))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            "ffmpeg decoder started"
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child: Some(child),
            stdout,
            stderr,
            frame_len,
        })
    }

    /// Reap the decoder once stdout is exhausted and turn a failed exit into an error.
    fn finish(&mut self) -> PanoResult<()> {
        self.stdout = None;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| PanoError::frame_source(format!("waiting for ffmpeg failed: {e}")))?;
        if !status.success() {
            return Err(PanoError::frame_source(format!(
                "ffmpeg decode failed for '{}' ({status}): {}",
                self.path.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// `ffmpeg` arguments that stream the first video stream of `path` as raw `rgb24`.
///
/// Frames come out in stored orientation (no autorotate) and one per decoded frame (no
/// constant-rate duplication or dropping), so they match the probed size and frame count.
pub(crate) fn decode_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        [
            "-map",
            "0:v:0",
            "-an",
            "-sn",
            "-fps_mode",
            "passthrough",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "pipe:1",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

impl FrameSource for FfmpegFrameSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> PanoResult<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.frame_len];
        let filled = read_full(stdout, &mut buf).map_err(|e| {
            PanoError::frame_source(format!(
                "reading decoded frames from '{}' failed: {e}",
                self.path.display()
            ))
        })?;

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < self.frame_len {
            let status = self.finish();
            return Err(PanoError::frame_source(format!(
                "decoding of '{}' stopped mid-frame ({filled} of {} bytes){}",
                self.path.display(),
                self.frame_len,
                status.err().map(|e| format!(": {e}")).unwrap_or_default()
            )));
        }

        Frame::new(self.info.width, self.info.height, PixelLayout::Rgb8, buf).map(Some)
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

pub(crate) fn probe_video(path: &Path) -> PanoResult<SourceInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| PanoError::frame_source(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(PanoError::frame_source(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe(&out.stdout).map_err(|e| match e {
        PanoError::Source(msg) => {
            PanoError::frame_source(format!("'{}': {msg}", path.display()))
        }
        other => other,
    })
}

pub(crate) fn parse_probe(json: &[u8]) -> PanoResult<SourceInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| PanoError::frame_source(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PanoError::frame_source("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| PanoError::frame_source("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| PanoError::frame_source("missing video height from ffprobe"))?;

    let fps = [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(parse_ff_ratio)
        .map(|(n, d)| f64::from(n) / f64::from(d))
        .find(|fps| *fps > 0.0)
        .unwrap_or(0.0);

    let duration = stream
        .duration
        .as_deref()
        .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|s| s.parse::<f64>().ok());

    Ok(SourceInfo {
        width,
        height,
        total_frames: frame_count(stream.nb_frames.as_deref(), duration, fps),
        fps,
    })
}

/// Prefer the container's frame count; otherwise estimate from duration and rate.
fn frame_count(nb_frames: Option<&str>, duration_sec: Option<f64>, fps: f64) -> u64 {
    if let Some(n) = nb_frames.and_then(|s| s.parse::<u64>().ok())
        && n > 0
    {
        return n;
    }
    match duration_sec {
        Some(d) if d.is_finite() && d > 0.0 && fps > 0.0 => (d * fps).round() as u64,
        _ => 0,
    }
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once('/')?;
    let a = a.parse::<u32>().ok()?;
    let b = b.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
