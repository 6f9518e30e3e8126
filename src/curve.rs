//! Distance-to-interval curve.

/// A single key of an [`IntervalCurve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveKey {
    /// Excess distance beyond the audible radius, world units.
    pub distance: f32,
    /// Tick interval requested at that distance, seconds.
    pub interval: f32,
}

/// Piecewise-linear mapping from excess listener distance to tick interval.
///
/// Designers use this to trade responsiveness for evaluation cost: distant
/// listeners are re-evaluated less often. Evaluation clamps at the first and
/// last key and interpolates linearly between keys. An empty curve evaluates
/// to zero, which means "tick every frame".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalCurve {
    keys: Vec<CurveKey>,
}

impl IntervalCurve {
    /// Builds a curve from `(distance, interval)` pairs, sorted by distance.
    pub fn new(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut keys: Vec<CurveKey> = keys
            .into_iter()
            .map(|(distance, interval)| CurveKey { distance, interval })
            .collect();
        keys.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { keys }
    }

    /// Curve that returns the same interval at any distance.
    pub fn constant(interval: f32) -> Self {
        Self::new([(0.0, interval)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluates the curve at the given distance. Never negative.
    pub fn eval(&self, distance: f32) -> f32 {
        let interval = match self.keys.as_slice() {
            [] => 0.0,
            [only] => only.interval,
            [first, ..] if distance <= first.distance => first.interval,
            [.., last] if distance >= last.distance => last.interval,
            keys => {
                let next = keys
                    .iter()
                    .position(|key| key.distance > distance)
                    .unwrap_or(keys.len() - 1);
                let a = keys[next - 1];
                let b = keys[next];
                let span = b.distance - a.distance;
                if span <= f32::EPSILON {
                    a.interval
                } else {
                    let t = (distance - a.distance) / span;
                    a.interval + (b.interval - a.interval) * t
                }
            }
        };
        interval.max(0.0)
    }
}
