//! Triangular cross-sections and their flattening into line vertex streams.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Scalars per vertex position.
pub const COMPONENTS_PER_VERTEX: usize = 3;

/// Pen-up marker in continuous streams. Consumers treat any non-finite
/// component as a break and draw nothing across it.
pub const GAP_VERTEX: [f32; COMPONENTS_PER_VERTEX] = [f32::NAN; COMPONENTS_PER_VERTEX];

const HALF_SQRT_3: f64 = 0.866_025_403_784_438_6;

/// How cross-sections are laid out in the vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionMode {
    /// Independent segments `v1→v2`, `v2→v3`, `v3→v1`, two vertices each.
    #[default]
    DiscreteEdges,
    /// One polyline loop `v1, v2, v3, v1` followed by a gap vertex.
    ContinuousWithBreaks,
}

impl EmissionMode {
    pub const fn vertices_per_section(self) -> usize {
        match self {
            Self::DiscreteEdges => 6,
            Self::ContinuousWithBreaks => 5,
        }
    }

    pub const fn floats_per_section(self) -> usize {
        self.vertices_per_section() * COMPONENTS_PER_VERTEX
    }
}

/// Equilateral triangle around a curve sample, perpendicular to its tangent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSection {
    pub center: Point3<f64>,
    pub vertices: [Point3<f64>; 3],
}

impl CrossSection {
    /// Places the vertices at distance `radius` from `center` in the
    /// normal/binormal plane, the first one along the normal.
    pub fn new(frame: &Frame, center: Point3<f64>, radius: f64) -> Self {
        let back = center - frame.normal * (radius * 0.5);
        let side = frame.binormal * (radius * HALF_SQRT_3);
        Self {
            center,
            vertices: [center + frame.normal * radius, back + side, back - side],
        }
    }

    pub fn edges(&self) -> [(Point3<f64>, Point3<f64>); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    /// Appends this section's vertices to `out` according to `mode`.
    pub fn emit_into(&self, mode: EmissionMode, out: &mut Vec<f32>) {
        match mode {
            EmissionMode::DiscreteEdges => {
                for (start, end) in self.edges() {
                    push_point(out, &start);
                    push_point(out, &end);
                }
            }
            EmissionMode::ContinuousWithBreaks => {
                let [a, b, c] = self.vertices;
                for vertex in [a, b, c, a] {
                    push_point(out, &vertex);
                }
                out.extend_from_slice(&GAP_VERTEX);
            }
        }
    }
}

/// Flattens `sections` in order into `out`, which is cleared first.
pub fn emit(sections: &[CrossSection], mode: EmissionMode, out: &mut Vec<f32>) {
    out.clear();
    out.reserve(sections.len() * mode.floats_per_section());
    for section in sections {
        section.emit_into(mode, out);
    }
}

/// True when a vertex marks a break in a continuous stream.
pub fn is_gap(vertex: &[f32]) -> bool {
    vertex.iter().any(|component| !component.is_finite())
}

fn push_point(out: &mut Vec<f32>, point: &Point3<f64>) {
    out.extend_from_slice(&[point.x as f32, point.y as f32, point.z as f32]);
}
