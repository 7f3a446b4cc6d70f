//! Parametric curves and the sampler that turns them into point sequences.

use std::ops::Deref;

use nalgebra::Point3;

use crate::{Parameters, Result, RibbonError};

/// Pure mapping from a curve parameter to a point in space.
pub trait CurveFunction {
    fn evaluate(&self, t: f64, params: &Parameters) -> Point3<f64>;
}

impl<F> CurveFunction for F
where
    F: Fn(f64, &Parameters) -> Point3<f64>,
{
    fn evaluate(&self, t: f64, params: &Parameters) -> Point3<f64> {
        self(t, params)
    }
}

/// Helix-like ribbon whose radius pulses with `cos(t)` while it advances
/// along X.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwistedRibbon;

impl CurveFunction for TwistedRibbon {
    fn evaluate(&self, t: f64, params: &Parameters) -> Point3<f64> {
        let envelope = params.radius * t.cos();
        let phase = params.angular_rate * t;
        Point3::new(
            t * params.stretch,
            envelope * phase.cos(),
            envelope * phase.sin(),
        )
    }
}

/// Ordered snapshot of curve samples. Regenerated wholesale on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSequence(Vec<Point3<f64>>);

impl PointSequence {
    pub fn into_inner(self) -> Vec<Point3<f64>> {
        self.0
    }
}

impl Deref for PointSequence {
    type Target = [Point3<f64>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Samples `count` points, the i-th at curve parameter `i * index_step`.
///
/// At least two samples are required; a single point has no tangent.
pub fn sample<C>(curve: &C, count: usize, params: &Parameters) -> Result<PointSequence>
where
    C: CurveFunction + ?Sized,
{
    if count < 2 {
        return Err(RibbonError::TooFewSamples {
            min: 2,
            actual: count,
        });
    }

    let points = (0..count)
        .map(|index| curve.evaluate(index as f64 * params.index_step, params))
        .collect();
    Ok(PointSequence(points))
}
