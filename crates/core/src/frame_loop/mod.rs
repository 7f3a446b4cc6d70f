//! Cooperative per-frame driver: sync the buffers, upload, draw.

use crate::{
    curve::TwistedRibbon,
    render::{DrawStats, RenderGraph},
    snapshot::Snapshot,
    sync::{BufferSync, ParameterStore},
    AppConfig, Result, RibbonError,
};

/// What happened during one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub frame: u64,
    pub recomputed: bool,
    /// Set when the pass failed; the previous buffers were drawn instead.
    pub error: Option<RibbonError>,
    pub stats: DrawStats,
}

/// Owns the buffer synchronizer and the renderer for the lifetime of the
/// process. The parameter store is the context shared with the event side.
#[derive(Debug)]
pub struct FrameLoop {
    store: ParameterStore,
    sync: BufferSync,
    render: RenderGraph,
    frame: u64,
}

impl FrameLoop {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let sync = BufferSync::new(
            TwistedRibbon,
            config.build_gradient()?,
            config.emission,
            config.degeneracy,
            config.sample_count,
        )?;
        Ok(Self {
            store: ParameterStore::new(config.parameters, config.sample_count),
            sync,
            render: RenderGraph::new(config.camera),
            frame: 0,
        })
    }

    /// Handle for the configuration collaborator to push edits through.
    pub fn parameters(&self) -> ParameterStore {
        self.store.clone()
    }

    pub fn sync(&self) -> &BufferSync {
        &self.sync
    }

    pub fn render(&self) -> &RenderGraph {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut RenderGraph {
        &mut self.render
    }

    /// Explicitly reallocates the buffers for a new sample count and
    /// records the new count in the store.
    pub fn resize(&mut self, sample_count: usize) -> Result<()> {
        self.sync.reallocate(sample_count)?;
        self.store.set_sample_count(sample_count)
    }

    /// Runs one frame. A failed pass is reported but does not stop the loop;
    /// the last good buffers stay on screen.
    pub fn run_frame(&mut self) -> Result<FrameReport> {
        self.frame += 1;

        let (recomputed, error) = match self.sync.tick(&self.store) {
            Ok(recomputed) => (recomputed, None),
            Err(err @ RibbonError::Poisoned(_)) => return Err(err),
            Err(err) => {
                tracing::warn!(
                    frame = self.frame,
                    error = %err,
                    "recomputation failed, keeping last buffers"
                );
                (false, Some(err))
            }
        };

        if let Some(view) = self.sync.take_upload() {
            self.render.upload(view)?;
        }
        let current = self.store.current()?;
        self.render.set_line_width(current.parameters.line_width);

        Ok(FrameReport {
            frame: self.frame,
            recomputed,
            error,
            stats: self.render.draw()?,
        })
    }

    /// Captures the live parameters and camera pose for export.
    pub fn export(&self) -> Result<Snapshot> {
        let current = self.store.current()?;
        Ok(Snapshot::capture(&current.parameters, self.render.camera()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mapping::ParameterUpdate, ribbon::EmissionMode};

    fn config(sample_count: usize, emission: EmissionMode) -> AppConfig {
        AppConfig {
            sample_count,
            emission,
            ..Default::default()
        }
    }

    #[test]
    fn first_frame_uploads_and_later_frames_reuse() {
        let mut frame_loop = FrameLoop::new(&config(5000, EmissionMode::DiscreteEdges)).unwrap();

        let first = frame_loop.run_frame().unwrap();
        assert!(first.recomputed);
        assert_eq!(first.stats.vertices, 30_000);
        assert_eq!(first.stats.segments, 15_000);
        assert_eq!(first.stats.uploads, 1);

        let second = frame_loop.run_frame().unwrap();
        assert!(!second.recomputed);
        assert_eq!(second.stats.uploads, 1);
    }

    #[test]
    fn continuous_mode_draws_three_segments_per_section() {
        let mut frame_loop =
            FrameLoop::new(&config(100, EmissionMode::ContinuousWithBreaks)).unwrap();
        let report = frame_loop.run_frame().unwrap();
        assert_eq!(report.stats.vertices, 500);
        assert_eq!(report.stats.segments, 300);
    }

    #[test]
    fn edits_between_frames_trigger_one_upload() {
        let mut frame_loop = FrameLoop::new(&config(64, EmissionMode::DiscreteEdges)).unwrap();
        frame_loop.run_frame().unwrap();

        let editor = frame_loop.parameters();
        editor.apply(&[ParameterUpdate::new("r", 1.0)]).unwrap();
        editor.apply(&[ParameterUpdate::new("w", 2.0)]).unwrap();

        let report = frame_loop.run_frame().unwrap();
        assert!(report.recomputed);
        assert_eq!(report.stats.uploads, 2);
    }

    #[test]
    fn failed_pass_keeps_drawing_previous_buffers() {
        let mut frame_loop = FrameLoop::new(&config(64, EmissionMode::DiscreteEdges)).unwrap();
        frame_loop.run_frame().unwrap();

        frame_loop.parameters().set_sample_count(128).unwrap();
        let report = frame_loop.run_frame().unwrap();
        assert!(matches!(
            report.error,
            Some(RibbonError::CapacityMismatch { .. })
        ));
        assert_eq!(report.stats.vertices, 64 * 6);

        frame_loop.resize(128).unwrap();
        let report = frame_loop.run_frame().unwrap();
        assert!(report.error.is_none());
        assert_eq!(report.stats.vertices, 128 * 6);
    }

    #[test]
    fn export_replays_to_the_same_parameters() {
        let mut frame_loop = FrameLoop::new(&config(64, EmissionMode::DiscreteEdges)).unwrap();
        frame_loop.parameters().update(|p| p.stretch = 0.75).unwrap();
        frame_loop.render_mut().camera_mut().position = [0.0, 10.0, 0.0];

        let snapshot = frame_loop.export().unwrap();
        let replayed = snapshot.apply_to(&AppConfig::default()).unwrap();
        assert_eq!(replayed.parameters.stretch, 0.75);
        assert_eq!(replayed.camera.position, [0.0, 10.0, 0.0]);
    }
}
