use crate::{
    ribbon::{is_gap, EmissionMode, COMPONENTS_PER_VERTEX},
    scene::{CameraPose, Projection},
    sync::RenderView,
    Result, RibbonError,
};

/// Rendering backend stand-in. It keeps an uploaded copy of the buffers, as
/// a GPU would, and reports what a line renderer would rasterize.
#[derive(Debug, Default)]
pub struct RenderGraph {
    camera: CameraPose,
    projection: Projection,
    line_width: f64,
    positions: Vec<f32>,
    colors: Vec<f32>,
    mode: EmissionMode,
    segments: usize,
    uploads: usize,
}

/// Summary of one drawn frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub vertices: usize,
    pub segments: usize,
    pub uploads: usize,
}

impl RenderGraph {
    pub fn new(camera: CameraPose) -> Self {
        Self {
            camera,
            line_width: 1.0,
            ..Default::default()
        }
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraPose {
        &mut self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_line_width(&mut self, line_width: f64) {
        self.line_width = line_width;
    }

    /// Copies a freshly completed buffer pair into renderer-owned storage.
    pub fn upload(&mut self, view: RenderView<'_>) -> Result<()> {
        if view.positions.len() != view.colors.len()
            || view.positions.len() != view.vertex_count * COMPONENTS_PER_VERTEX
        {
            return Err(RibbonError::msg(format!(
                "inconsistent upload: {} positions, {} colors, {} vertices",
                view.positions.len(),
                view.colors.len(),
                view.vertex_count
            )));
        }

        self.positions.clear();
        self.positions.extend_from_slice(view.positions);
        self.colors.clear();
        self.colors.extend_from_slice(view.colors);
        self.mode = view.mode;
        self.segments = count_segments(&self.positions, self.mode);
        self.uploads += 1;
        Ok(())
    }

    pub fn draw(&self) -> Result<DrawStats> {
        let stats = DrawStats {
            vertices: self.positions.len() / COMPONENTS_PER_VERTEX,
            segments: self.segments,
            uploads: self.uploads,
        };
        tracing::trace!(
            vertices = stats.vertices,
            segments = stats.segments,
            line_width = self.line_width,
            camera_distance = self.camera.distance_to_target(),
            fov = self.projection.fov_degrees,
            "draw"
        );
        Ok(stats)
    }
}

/// Number of line segments a renderer draws from `positions`.
///
/// Discrete streams pair vertices two by two. Continuous streams connect
/// each vertex to the next unless either one is a gap.
pub fn count_segments(positions: &[f32], mode: EmissionMode) -> usize {
    let vertices: Vec<&[f32]> = positions.chunks_exact(COMPONENTS_PER_VERTEX).collect();
    match mode {
        EmissionMode::DiscreteEdges => vertices
            .chunks_exact(2)
            .filter(|pair| !is_gap(pair[0]) && !is_gap(pair[1]))
            .count(),
        EmissionMode::ContinuousWithBreaks => vertices
            .windows(2)
            .filter(|pair| !is_gap(pair[0]) && !is_gap(pair[1]))
            .count(),
    }
}
