use serde::{Deserialize, Serialize};

/// Camera pose reported by the render collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: [f64; 3],
    /// Euler angles in radians, XYZ order.
    pub rotation: [f64; 3],
    /// Point the orbit controls look at.
    pub target: [f64; 3],
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: [25.0, 1.75, 4.0],
            rotation: [0.0; 3],
            target: [0.0; 3],
        }
    }
}

/// Perspective projection settings of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 120.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraPose {
    pub fn distance_to_target(&self) -> f64 {
        self.position
            .iter()
            .zip(&self.target)
            .map(|(p, t)| (p - t).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}
