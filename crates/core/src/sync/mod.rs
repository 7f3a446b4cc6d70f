//! Keeps the render buffers in step with the live parameters.
//!
//! [`ParameterStore`] is the shared, thread-safe side written by the
//! configuration collaborator. [`BufferSync`] is owned by the render loop; it
//! drains the store's dirty flag once per frame and rebuilds the buffers in
//! place.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    buffer::VertexBuffer,
    curve::{self, CurveFunction},
    frame::{self, DegeneracyPolicy},
    gradient::Gradient,
    mapping::ParameterUpdate,
    ribbon::{self, CrossSection, EmissionMode},
    Parameters, Result, RibbonError,
};

/// Parameters and sample count as read by one recomputation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassInput {
    pub parameters: Parameters,
    pub sample_count: usize,
}

#[derive(Debug)]
struct StoreState {
    input: PassInput,
    dirty: bool,
}

/// Shared handle to the live parameters and their dirty flag.
///
/// Cloning yields another handle to the same state, so the event side and
/// the render loop can each hold one.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    shared: Arc<Mutex<StoreState>>,
}

impl ParameterStore {
    /// Creates a store that starts dirty so the first frame fills the buffers.
    pub fn new(parameters: Parameters, sample_count: usize) -> Self {
        Self {
            shared: Arc::new(Mutex::new(StoreState {
                input: PassInput {
                    parameters,
                    sample_count,
                },
                dirty: true,
            })),
        }
    }

    /// Copy of the current values without touching the dirty flag.
    pub fn current(&self) -> Result<PassInput> {
        Ok(self.lock()?.input)
    }

    pub fn is_dirty(&self) -> Result<bool> {
        Ok(self.lock()?.dirty)
    }

    /// Mutates the parameters through `edit` and raises the dirty flag.
    pub fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Parameters),
    {
        let mut state = self.lock()?;
        edit(&mut state.input.parameters);
        state.dirty = true;
        Ok(())
    }

    /// Applies named updates as one batch.
    ///
    /// Nothing is applied when any target is unknown.
    pub fn apply(&self, updates: &[ParameterUpdate]) -> Result<()> {
        let mut state = self.lock()?;
        let mut parameters = state.input.parameters;
        for update in updates {
            update.apply_to(&mut parameters)?;
        }
        state.input.parameters = parameters;
        state.dirty |= !updates.is_empty();
        Ok(())
    }

    /// Requests a new sample count. The buffers have to be reallocated
    /// explicitly before the next pass can succeed.
    pub fn set_sample_count(&self, sample_count: usize) -> Result<()> {
        let mut state = self.lock()?;
        state.input.sample_count = sample_count;
        state.dirty = true;
        Ok(())
    }

    /// Marks the store dirty without changing any value.
    pub fn invalidate(&self) -> Result<()> {
        self.lock()?.dirty = true;
        Ok(())
    }

    /// Checks and clears the dirty flag, returning a copy of the values when
    /// it was set. Both happen under the same lock.
    pub fn take_dirty(&self) -> Result<Option<PassInput>> {
        let mut state = self.lock()?;
        if !state.dirty {
            return Ok(None);
        }
        state.dirty = false;
        Ok(Some(state.input))
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.shared
            .lock()
            .map_err(|_| RibbonError::Poisoned("parameter store"))
    }
}

/// Whether the buffers reflect the last parameters seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Clean,
    Dirty,
}

/// Read-only view handed to the renderer after a completed pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub positions: &'a [f32],
    pub colors: &'a [f32],
    pub vertex_count: usize,
    pub mode: EmissionMode,
}

/// Owner of the fixed-capacity position and color buffers.
pub struct BufferSync {
    curve: Box<dyn CurveFunction + Send>,
    gradient: Gradient,
    mode: EmissionMode,
    policy: DegeneracyPolicy,
    sample_count: usize,
    positions: VertexBuffer,
    colors: VertexBuffer,
    scratch_positions: Vec<f32>,
    scratch_colors: Vec<f32>,
    pending: Option<PassInput>,
    state: SyncState,
    needs_upload: bool,
}

impl BufferSync {
    /// Allocates buffers for `sample_count` samples. The initial state is
    /// [`SyncState::Dirty`].
    pub fn new<C>(
        curve: C,
        gradient: Gradient,
        mode: EmissionMode,
        policy: DegeneracyPolicy,
        sample_count: usize,
    ) -> Result<Self>
    where
        C: CurveFunction + Send + 'static,
    {
        check_sample_count(sample_count)?;
        let len = buffer_len(sample_count, mode);
        Ok(Self {
            curve: Box::new(curve),
            gradient,
            mode,
            policy,
            sample_count,
            positions: VertexBuffer::zeroed(len),
            colors: VertexBuffer::zeroed(len),
            scratch_positions: Vec::with_capacity(len),
            scratch_colors: Vec::with_capacity(len),
            pending: None,
            state: SyncState::Dirty,
            needs_upload: false,
        })
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn mode(&self) -> EmissionMode {
        self.mode
    }

    pub fn positions(&self) -> &[f32] {
        self.positions.as_slice()
    }

    pub fn colors(&self) -> &[f32] {
        self.colors.as_slice()
    }

    /// Replaces the color gradient; the next pass recolors the buffer.
    pub fn set_gradient(&mut self, gradient: Gradient) {
        self.gradient = gradient;
        self.state = SyncState::Dirty;
    }

    /// Discards both buffers and allocates new ones for `sample_count`.
    pub fn reallocate(&mut self, sample_count: usize) -> Result<()> {
        check_sample_count(sample_count)?;
        let len = buffer_len(sample_count, self.mode);
        tracing::info!(
            from = self.sample_count,
            to = sample_count,
            "reallocating ribbon buffers"
        );
        self.sample_count = sample_count;
        self.positions = VertexBuffer::zeroed(len);
        self.colors = VertexBuffer::zeroed(len);
        self.scratch_positions = Vec::with_capacity(len);
        self.scratch_colors = Vec::with_capacity(len);
        self.state = SyncState::Dirty;
        self.needs_upload = false;
        Ok(())
    }

    /// Per-frame entry point.
    ///
    /// Drains the store's dirty flag and, if anything is out of date, runs a
    /// full pass. Returns `true` when the buffers changed. On error the
    /// previous buffers are kept and the state stays dirty.
    pub fn tick(&mut self, store: &ParameterStore) -> Result<bool> {
        if let Some(input) = store.take_dirty()? {
            self.pending = Some(input);
            self.state = SyncState::Dirty;
        }

        if self.state == SyncState::Clean {
            return Ok(false);
        }

        let input = match self.pending {
            Some(input) => input,
            None => store.current()?,
        };
        self.recompute(&input)?;
        self.pending = None;
        Ok(true)
    }

    /// Runs one synchronous pass for `input`.
    ///
    /// Everything is produced into scratch storage first; the live buffers
    /// are only written once the whole pass has succeeded.
    pub fn recompute(&mut self, input: &PassInput) -> Result<()> {
        if input.sample_count != self.sample_count {
            return Err(RibbonError::CapacityMismatch {
                expected: self.sample_count,
                actual: input.sample_count,
            });
        }
        let params = &input.parameters;
        params.validate()?;

        let points = curve::sample(&*self.curve, self.sample_count, params)?;
        let frames = frame::frame_field(&points, self.policy)?;
        let sections: Vec<CrossSection> = frames
            .iter()
            .zip(points.iter())
            .map(|(frame, center)| CrossSection::new(frame, *center, params.cross_section_size))
            .collect();

        ribbon::emit(&sections, self.mode, &mut self.scratch_positions);
        fill_colors(
            &self.gradient,
            self.sample_count,
            self.mode,
            &mut self.scratch_colors,
        );

        if self.scratch_positions.len() != self.positions.len()
            || self.scratch_colors.len() != self.colors.len()
        {
            return Err(RibbonError::msg(format!(
                "pass produced {} positions and {} colors for buffers of {}",
                self.scratch_positions.len(),
                self.scratch_colors.len(),
                self.positions.len()
            )));
        }
        self.positions.overwrite(&self.scratch_positions)?;
        self.colors.overwrite(&self.scratch_colors)?;
        self.state = SyncState::Clean;
        self.needs_upload = true;
        tracing::debug!(
            samples = self.sample_count,
            scalars = self.positions.len(),
            "ribbon buffers recomputed"
        );
        Ok(())
    }

    /// Returns the buffers once after each completed pass.
    pub fn take_upload(&mut self) -> Option<RenderView<'_>> {
        if !std::mem::take(&mut self.needs_upload) {
            return None;
        }
        Some(self.view())
    }

    pub fn view(&self) -> RenderView<'_> {
        RenderView {
            positions: self.positions.as_slice(),
            colors: self.colors.as_slice(),
            vertex_count: self.positions.vertex_count(),
            mode: self.mode,
        }
    }
}

impl std::fmt::Debug for BufferSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSync")
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("sample_count", &self.sample_count)
            .field("scalars", &self.positions.len())
            .field("state", &self.state)
            .field("needs_upload", &self.needs_upload)
            .finish()
    }
}

/// Scalars needed per buffer for `sample_count` cross-sections.
pub fn buffer_len(sample_count: usize, mode: EmissionMode) -> usize {
    sample_count * mode.floats_per_section()
}

fn check_sample_count(sample_count: usize) -> Result<()> {
    if sample_count < 2 {
        return Err(RibbonError::TooFewSamples {
            min: 2,
            actual: sample_count,
        });
    }
    Ok(())
}

/// Every vertex of section `i` takes the gradient color at `i / (count - 1)`.
fn fill_colors(
    gradient: &Gradient,
    sample_count: usize,
    mode: EmissionMode,
    out: &mut Vec<f32>,
) {
    out.clear();
    let last = (sample_count - 1) as f32;
    for index in 0..sample_count {
        let rgb = gradient.color_at(index as f32 / last).to_array();
        for _ in 0..mode.vertices_per_section() {
            out.extend_from_slice(&rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curve::TwistedRibbon,
        gradient::{Color, GradientStop},
    };
    use nalgebra::Point3;

    fn gradient() -> Gradient {
        Gradient::new(vec![
            GradientStop::new(0.0, Color::new(1.0, 0.0, 0.0)),
            GradientStop::new(1.0, Color::new(0.0, 0.0, 1.0)),
        ])
        .unwrap()
    }

    fn sync(sample_count: usize, mode: EmissionMode) -> BufferSync {
        BufferSync::new(
            TwistedRibbon,
            gradient(),
            mode,
            DegeneracyPolicy::Fail,
            sample_count,
        )
        .unwrap()
    }

    #[test]
    fn first_tick_fills_buffers() {
        let store = ParameterStore::new(Parameters::default(), 5000);
        let mut sync = sync(5000, EmissionMode::DiscreteEdges);
        assert_eq!(sync.state(), SyncState::Dirty);

        assert!(sync.tick(&store).unwrap());
        assert_eq!(sync.state(), SyncState::Clean);
        assert_eq!(sync.positions().len(), 90_000);
        assert_eq!(sync.colors().len(), 90_000);

        let view = sync.take_upload().expect("a completed pass requests an upload");
        assert_eq!(view.vertex_count, 30_000);
        assert!(sync.take_upload().is_none());
        assert!(!sync.tick(&store).unwrap());
    }

    #[test]
    fn colors_run_from_first_to_last_stop() {
        let store = ParameterStore::new(Parameters::default(), 11);
        let mut sync = sync(11, EmissionMode::ContinuousWithBreaks);
        sync.tick(&store).unwrap();

        let colors = sync.colors();
        assert_eq!(&colors[..3], &[1.0, 0.0, 0.0]);
        assert_eq!(&colors[colors.len() - 3..], &[0.0, 0.0, 1.0]);
        // Section 5 of 11 sits half way along the gradient.
        let middle = 5 * EmissionMode::ContinuousWithBreaks.floats_per_section();
        assert!((colors[middle] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn recomputation_is_deterministic() {
        let store = ParameterStore::new(Parameters::default(), 300);
        let mut sync = sync(300, EmissionMode::DiscreteEdges);
        sync.tick(&store).unwrap();
        let first = sync.positions().to_vec();

        store.invalidate().unwrap();
        assert!(sync.tick(&store).unwrap());
        assert_eq!(sync.positions(), first.as_slice());
    }

    #[test]
    fn parameter_changes_coalesce_into_one_pass() {
        let store = ParameterStore::new(Parameters::default(), 100);
        let mut sync = sync(100, EmissionMode::DiscreteEdges);
        sync.tick(&store).unwrap();
        let before = sync.positions().to_vec();

        store.update(|p| p.radius = 3.0).unwrap();
        store.apply(&[ParameterUpdate::new("size", 0.4)]).unwrap();

        assert!(sync.tick(&store).unwrap());
        assert!(!sync.tick(&store).unwrap());
        assert_ne!(sync.positions(), before.as_slice());

        let current = store.current().unwrap();
        assert_eq!(current.parameters.radius, 3.0);
        assert_eq!(current.parameters.cross_section_size, 0.4);
    }

    #[test]
    fn sample_count_change_requires_reallocation() {
        let store = ParameterStore::new(Parameters::default(), 100);
        let mut sync = sync(100, EmissionMode::DiscreteEdges);
        sync.tick(&store).unwrap();
        let good = sync.positions().to_vec();

        store.set_sample_count(200).unwrap();
        let err = sync.tick(&store).unwrap_err();
        assert!(matches!(
            err,
            RibbonError::CapacityMismatch {
                expected: 100,
                actual: 200
            }
        ));
        assert_eq!(sync.positions(), good.as_slice());
        assert_eq!(sync.state(), SyncState::Dirty);

        sync.reallocate(200).unwrap();
        assert!(sync.tick(&store).unwrap());
        assert_eq!(sync.positions().len(), 200 * 18);
    }

    #[test]
    fn failed_pass_keeps_last_good_buffer() {
        let store = ParameterStore::new(Parameters::default(), 50);
        let mut sync = BufferSync::new(
            |t: f64, params: &Parameters| Point3::new((t * params.stretch).floor(), 0.0, 0.0),
            gradient(),
            EmissionMode::DiscreteEdges,
            DegeneracyPolicy::Fail,
            50,
        )
        .unwrap();

        store.update(|p| p.index_step = 1.0).unwrap();
        sync.tick(&store).unwrap();
        let good = sync.positions().to_vec();
        sync.take_upload();

        store.update(|p| p.index_step = 0.1).unwrap();
        let err = sync.tick(&store).unwrap_err();
        assert!(matches!(err, RibbonError::DegenerateCurve { .. }));
        assert_eq!(sync.positions(), good.as_slice());
        assert!(sync.take_upload().is_none());

        store.update(|p| p.index_step = 2.0).unwrap();
        assert!(sync.tick(&store).unwrap());
    }

    #[test]
    fn invalid_parameters_abort_before_writing() {
        let store = ParameterStore::new(Parameters::default(), 20);
        let mut sync = sync(20, EmissionMode::DiscreteEdges);
        sync.tick(&store).unwrap();
        let good = sync.positions().to_vec();

        store.update(|p| p.cross_section_size = -1.0).unwrap();
        assert!(matches!(
            sync.tick(&store),
            Err(RibbonError::InvalidParameter { .. })
        ));
        assert_eq!(sync.positions(), good.as_slice());
    }

    #[test]
    fn unknown_update_leaves_store_untouched() {
        let store = ParameterStore::new(Parameters::default(), 20);
        store.take_dirty().unwrap();

        let err = store
            .apply(&[
                ParameterUpdate::new("radius", 4.0),
                ParameterUpdate::new("depth", 1.0),
            ])
            .unwrap_err();
        assert!(matches!(err, RibbonError::UnknownParameter(_)));
        assert_eq!(store.current().unwrap().parameters, Parameters::default());
        assert!(!store.is_dirty().unwrap());
    }

    #[test]
    fn updates_from_another_thread_are_picked_up() {
        let store = ParameterStore::new(Parameters::default(), 64);
        let mut sync = sync(64, EmissionMode::DiscreteEdges);
        sync.tick(&store).unwrap();

        let editor = store.clone();
        std::thread::spawn(move || {
            for step in 1..=10 {
                editor.update(|p| p.radius = step as f64).unwrap();
            }
        })
        .join()
        .unwrap();

        assert!(sync.tick(&store).unwrap());
        assert_eq!(store.current().unwrap().parameters.radius, 10.0);
        assert!(!store.is_dirty().unwrap());
    }
}
