//! Read-only views of the best state: status text/HTML, PNG snapshots, periodic disk snapshots.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_types::{BestHandle, BestState};
use crate::error::TraceError;
use crate::fitness::MetricsSnapshot;
use crate::pixels::PixelBuffer;
use crate::render::CpuRenderer;

/// render the snapshot's circles at the target size
pub fn render_snapshot(state: &BestState) -> PixelBuffer {
    CpuRenderer::render(&state.circles, state.width, state.height)
}

/// PNG bytes of the best render
pub fn encode_png(state: &BestState) -> Result<Vec<u8>, TraceError> {
    profiling::scope!("encode_png");
    let img = render_snapshot(state).to_rgb_image();
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(TraceError::Encode)?;
    Ok(out.into_inner())
}

fn score_text(state: &BestState) -> String {
    if state.has_result() {
        state.score.to_string()
    } else {
        "-".to_owned()
    }
}

/// one-line plain-text status
pub fn status_line(state: &BestState, elapsed: Duration) -> String {
    format!(
        "generation={} score={} circles={} elapsed={:.1}s",
        state.generation,
        score_text(state),
        state.circles.len(),
        elapsed.as_secs_f64()
    )
}

/// small HTML status page, embeds the PNG endpoint
pub fn status_html(state: &BestState, elapsed: Duration) -> String {
    let psnr = if state.has_result() {
        let m = MetricsSnapshot::from_sse(state.score, state.width as usize * state.height as usize);
        format!("{:.2} dB", m.psnr)
    } else {
        "-".to_owned()
    };
    format!(
        "<html><head><title>circletrace</title></head><body>\
         Generation: {}<br/>\
         Score: {}<br/>\
         PSNR: {}<br/>\
         Circles: {}<br/>\
         Elapsed: {:.1}s<br/>\
         <img src=\"/best.png\" width=\"{}\" height=\"{}\"/>\
         </body></html>",
        state.generation,
        score_text(state),
        psnr,
        state.circles.len(),
        elapsed.as_secs_f64(),
        state.width,
        state.height
    )
}

/// writes the best render to disk every `interval` generations, skipping unchanged results
pub struct SnapshotWriter {
    path: PathBuf,
    interval: u64,
    last_written: Option<u64>, // improved_at of the last written state
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>, interval: u64) -> Self {
        Self { path: path.into(), interval: interval.max(1), last_written: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// true if the generation is on the interval
    pub fn is_due(&self, generation: u64) -> bool {
        generation % self.interval == 0
    }

    /// write the current best if it changed since the last write. returns whether a file was written.
    pub fn write_if_changed(&mut self, best: &BestHandle) -> Result<bool, TraceError> {
        let state = best.snapshot();
        if !state.has_result() || self.last_written == Some(state.improved_at) {
            return Ok(false);
        }
        self.write(&state)?;
        self.last_written = Some(state.improved_at);
        Ok(true)
    }

    fn write(&self, state: &BestState) -> Result<(), TraceError> {
        profiling::scope!("SnapshotWriter::write");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // format from extension, via a sibling temp file so readers never see a partial image
        let format = image::ImageFormat::from_path(&self.path).map_err(TraceError::Encode)?;
        let tmp = self.path.with_extension(format!(
            "tmp.{}",
            self.path.extension().and_then(|e| e.to_str()).unwrap_or("png")
        ));
        render_snapshot(state)
            .to_rgb_image()
            .save_with_format(&tmp, format)
            .map_err(TraceError::Encode)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), generation = state.generation, "wrote snapshot");
        Ok(())
    }
}
