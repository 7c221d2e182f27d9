//! Latency curves: swept parameter against time per access.

use serde::{Deserialize, Serialize};

/// One measured point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Swept parameter (stride, working-set bytes, way count, page count).
    pub parameter: usize,
    /// Average time per access in clock ticks, possibly normalised.
    pub latency: f64,
}

/// Ordered sequence of points in sweep order (ascending parameter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyCurve {
    points: Vec<CurvePoint>,
}

/// Ratio between two consecutive points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Index of the later point.
    pub index: usize,
    /// Parameter of the earlier point.
    pub before: usize,
    /// Parameter of the later point.
    pub after: usize,
    /// `latency[index] / latency[index - 1]`.
    pub ratio: f64,
}

impl LatencyCurve {
    /// Create an empty curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from parallel parameter and latency slices.
    ///
    /// Extra entries in the longer slice are ignored.
    pub fn from_pairs(parameters: &[usize], latencies: &[f64]) -> Self {
        parameters
            .iter()
            .zip(latencies)
            .map(|(&parameter, &latency)| CurvePoint { parameter, latency })
            .collect()
    }

    /// Append a point.
    pub fn push(&mut self, parameter: usize, latency: f64) {
        self.points.push(CurvePoint { parameter, latency });
    }

    /// All points in sweep order.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Parameter at `index`.
    pub fn parameter(&self, index: usize) -> Option<usize> {
        self.points.get(index).map(|p| p.parameter)
    }

    /// Ratio between point `index` and its predecessor.
    ///
    /// `None` for the first point, out-of-range indices, and whenever the
    /// predecessor is not a positive finite latency.
    pub fn ratio(&self, index: usize) -> Option<f64> {
        if index == 0 {
            return None;
        }
        let prev = self.points.get(index - 1)?.latency;
        let curr = self.points.get(index)?.latency;
        if !(prev.is_finite() && prev > 0.0 && curr.is_finite()) {
            return None;
        }
        Some(curr / prev)
    }

    /// Every defined consecutive ratio, in sweep order.
    pub fn steps(&self) -> impl Iterator<Item = Step> + '_ {
        (1..self.points.len()).filter_map(move |index| {
            self.ratio(index).map(|ratio| Step {
                index,
                before: self.points[index - 1].parameter,
                after: self.points[index].parameter,
                ratio,
            })
        })
    }

    /// Copy of the curve with every latency multiplied by its parameter.
    ///
    /// Removes the expected linear growth of per-access cost with stride.
    pub fn scaled_by_parameter(&self) -> Self {
        self.points
            .iter()
            .map(|p| CurvePoint {
                parameter: p.parameter,
                latency: p.latency * p.parameter as f64,
            })
            .collect()
    }
}

impl FromIterator<CurvePoint> for LatencyCurve {
    fn from_iter<I: IntoIterator<Item = CurvePoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios() {
        let curve = LatencyCurve::from_pairs(&[1, 2, 4], &[2.0, 4.0, 4.0]);
        assert_eq!(curve.ratio(0), None);
        assert_eq!(curve.ratio(1), Some(2.0));
        assert_eq!(curve.ratio(2), Some(1.0));
        assert_eq!(curve.ratio(3), None);
    }

    #[test]
    fn test_zero_predecessor_has_no_ratio() {
        let curve = LatencyCurve::from_pairs(&[1, 2, 4], &[0.0, 4.0, 8.0]);
        let steps: Vec<Step> = curve.steps().collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].index, 2);
        assert_eq!(steps[0].before, 2);
        assert_eq!(steps[0].after, 4);
    }

    #[test]
    fn test_scaled_by_parameter() {
        let curve = LatencyCurve::from_pairs(&[8, 16], &[1.5, 1.0]);
        let scaled = curve.scaled_by_parameter();
        assert_eq!(scaled.points()[0].latency, 12.0);
        assert_eq!(scaled.points()[1].latency, 16.0);
        assert_eq!(scaled.parameter(1), Some(16));
    }
}
