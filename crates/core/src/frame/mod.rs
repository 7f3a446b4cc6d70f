//! Moving frames along sampled curves.
//!
//! Tangents come from finite differences and carry no ordering constraint.
//! Normals are transported from one sample to the next, so the second pass is
//! a strict left-to-right fold over the tangents.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Result, RibbonError};

/// Difference vectors shorter than this are treated as coincident samples.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Above this |tangent.y| the world Y axis is too close to serve as "up".
const UP_SWITCH_THRESHOLD: f64 = 0.9;

/// Recovery applied when two samples used for a tangent coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneracyPolicy {
    /// Abort the pass with [`RibbonError::DegenerateCurve`].
    #[default]
    Fail,
    /// Reuse the previous sample's tangent. The first sample has none to
    /// reuse and still fails.
    RetainPrevious,
}

/// Orthonormal frame at one curve sample. `binormal = tangent × normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub binormal: Vector3<f64>,
}

impl Frame {
    /// Frame built from a fixed world "up" reference.
    ///
    /// Uses +Y unless the tangent is nearly vertical, in which case +X.
    pub fn seeded(tangent: Vector3<f64>) -> Self {
        let up = if tangent.y.abs() > UP_SWITCH_THRESHOLD {
            Vector3::x()
        } else {
            Vector3::y()
        };

        let binormal = tangent.cross(&up).normalize();
        let normal = binormal.cross(&tangent).normalize();
        Self {
            tangent,
            normal,
            binormal,
        }
    }

    /// Carries `previous_normal` onto the plane perpendicular to `tangent`.
    ///
    /// When the previous normal is parallel to the new tangent the
    /// transported binormal vanishes and the frame is reseeded instead.
    pub fn transported(tangent: Vector3<f64>, previous_normal: &Vector3<f64>) -> Self {
        match tangent.cross(previous_normal).try_normalize(DEGENERATE_EPSILON) {
            Some(binormal) => {
                let normal = binormal.cross(&tangent).normalize();
                Self {
                    tangent,
                    normal,
                    binormal,
                }
            }
            None => {
                tracing::debug!("previous normal parallel to tangent, reseeding frame");
                Self::seeded(tangent)
            }
        }
    }

    /// Seeded when there is no previous normal, transported otherwise.
    pub fn next(tangent: Vector3<f64>, previous_normal: Option<&Vector3<f64>>) -> Self {
        match previous_normal {
            Some(normal) => Self::transported(tangent, normal),
            None => Self::seeded(tangent),
        }
    }
}

/// Unit tangent at sample `index` by forward, central or backward difference.
///
/// Fails with [`RibbonError::DegenerateCurve`] when the difference vanishes.
pub fn tangent(index: usize, points: &[Point3<f64>]) -> Result<Vector3<f64>> {
    let last = points.len().saturating_sub(1);
    if last == 0 || index > last {
        return Err(RibbonError::TooFewSamples {
            min: 2,
            actual: points.len(),
        });
    }

    let delta = if index == 0 {
        points[1] - points[0]
    } else if index == last {
        points[last] - points[last - 1]
    } else {
        points[index + 1] - points[index - 1]
    };

    delta
        .try_normalize(DEGENERATE_EPSILON)
        .ok_or(RibbonError::DegenerateCurve { index })
}

/// Tangents for every sample, applying `policy` to coincident samples.
pub fn tangents(points: &[Point3<f64>], policy: DegeneracyPolicy) -> Result<Vec<Vector3<f64>>> {
    let mut tangents: Vec<Vector3<f64>> = Vec::with_capacity(points.len());
    for index in 0..points.len() {
        let estimate = match (tangent(index, points), policy, tangents.last()) {
            (Ok(tangent), _, _) => tangent,
            (
                Err(RibbonError::DegenerateCurve { .. }),
                DegeneracyPolicy::RetainPrevious,
                Some(previous),
            ) => {
                tracing::debug!(index, "coincident samples, retaining previous tangent");
                *previous
            }
            (Err(err), _, _) => return Err(err),
        };
        tangents.push(estimate);
    }
    Ok(tangents)
}

/// Frames for every sample, each normal transported from its predecessor.
pub fn frame_field(points: &[Point3<f64>], policy: DegeneracyPolicy) -> Result<Vec<Frame>> {
    let tangents = tangents(points, policy)?;

    let frames = tangents
        .into_iter()
        .scan(None::<Vector3<f64>>, |previous_normal, tangent| {
            let frame = Frame::next(tangent, previous_normal.as_ref());
            *previous_normal = Some(frame.normal);
            Some(frame)
        })
        .collect();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{curve, curve::TwistedRibbon, Parameters};
    use approx::assert_relative_eq;

    fn assert_orthonormal(frame: &Frame) {
        assert_relative_eq!(frame.tangent.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.normal.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.binormal.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.tangent.dot(&frame.normal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(frame.tangent.dot(&frame.binormal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(frame.normal.dot(&frame.binormal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(
            frame.tangent.cross(&frame.normal),
            frame.binormal,
            epsilon = 1e-5
        );
    }

    fn ribbon_points(count: usize) -> Vec<Point3<f64>> {
        curve::sample(&TwistedRibbon, count, &Parameters::default())
            .unwrap()
            .into_inner()
    }

    #[test]
    fn uses_one_sided_differences_at_the_ends() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];

        assert_relative_eq!(tangent(0, &points).unwrap(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(tangent(2, &points).unwrap(), Vector3::y(), epsilon = 1e-12);
        let middle = Vector3::new(1.0, 1.0, 0.0).normalize();
        assert_relative_eq!(tangent(1, &points).unwrap(), middle, epsilon = 1e-12);
    }

    #[test]
    fn frames_are_orthonormal_along_the_ribbon() {
        let frames = frame_field(&ribbon_points(5000), DegeneracyPolicy::Fail).unwrap();
        assert_eq!(frames.len(), 5000);
        frames.iter().for_each(assert_orthonormal);
    }

    #[test]
    fn two_samples_are_enough() {
        let points = vec![Point3::origin(), Point3::new(0.0, 0.0, 1.0)];
        let frames = frame_field(&points, DegeneracyPolicy::Fail).unwrap();
        assert_eq!(frames.len(), 2);
        frames.iter().for_each(assert_orthonormal);
    }

    #[test]
    fn seed_switches_up_axis_for_vertical_tangents() {
        let frame = Frame::seeded(Vector3::y());
        assert_orthonormal(&frame);
        assert_relative_eq!(frame.binormal, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);

        let frame = Frame::seeded(Vector3::x());
        assert_relative_eq!(frame.normal, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn normal_twist_is_bounded_by_tangent_turn() {
        let frames = frame_field(&ribbon_points(2000), DegeneracyPolicy::Fail).unwrap();

        for pair in frames.windows(2) {
            let tangent_turn = pair[0].tangent.angle(&pair[1].tangent);
            let normal_turn = pair[0].normal.angle(&pair[1].normal);
            assert!(
                normal_turn <= tangent_turn + 1e-6,
                "normal turned {normal_turn} while tangent turned {tangent_turn}"
            );
        }
    }

    #[test]
    fn straight_line_keeps_a_constant_frame() {
        let points: Vec<_> = (0..10)
            .map(|i| Point3::new(i as f64, 0.0, 0.0))
            .collect();
        let frames = frame_field(&points, DegeneracyPolicy::Fail).unwrap();
        for frame in &frames {
            assert_relative_eq!(frame.normal, frames[0].normal, epsilon = 1e-12);
        }
    }

    #[test]
    fn coincident_samples_fail_by_default() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let err = frame_field(&points, DegeneracyPolicy::Fail).unwrap_err();
        assert!(matches!(err, RibbonError::DegenerateCurve { index: 2 }));
    }

    #[test]
    fn coincident_samples_can_retain_previous_tangent() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let frames = frame_field(&points, DegeneracyPolicy::RetainPrevious).unwrap();
        assert_relative_eq!(frames[2].tangent, frames[1].tangent, epsilon = 1e-12);
        frames.iter().for_each(assert_orthonormal);

        let leading = vec![Point3::origin(), Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let err = frame_field(&leading, DegeneracyPolicy::RetainPrevious).unwrap_err();
        assert!(matches!(err, RibbonError::DegenerateCurve { index: 0 }));
    }

    #[test]
    fn reseeds_when_previous_normal_is_parallel_to_tangent() {
        let frame = Frame::transported(Vector3::y(), &Vector3::y());
        assert_orthonormal(&frame);
        assert_eq!(frame, Frame::seeded(Vector3::y()));
    }
}
