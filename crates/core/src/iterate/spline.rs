/// Natural cubic spline through strictly increasing knots.
///
/// The second derivative vanishes at both ends. Evaluation outside the knot
/// range clamps to the end values, and evaluation exactly at a knot returns
/// the knot value without rounding.
pub(crate) struct CubicSpline<'a> {
    x: &'a [f64],
    y: &'a [f64],
    moments: Vec<f64>,
}

impl<'a> CubicSpline<'a> {
    /// Fits the spline.
    ///
    /// Callers guarantee `x.len() == y.len() >= 2` and that `x` strictly
    /// increases.
    pub(crate) fn new(x: &'a [f64], y: &'a [f64]) -> Self {
        debug_assert_eq!(x.len(), y.len());
        debug_assert!(x.len() >= 2);

        Self {
            x,
            y,
            moments: natural_moments(x, y),
        }
    }

    pub(crate) fn evaluate(&self, t: f64) -> f64 {
        let (x, y, m) = (self.x, self.y, &self.moments);
        let n = x.len();
        let t = t.clamp(x[0], x[n - 1]);

        let hi = x.partition_point(|&k| k <= t);
        if hi == n {
            return y[n - 1];
        }
        let i = hi - 1;
        let b = t - x[i];
        if b == 0.0 {
            return y[i];
        }
        let h = x[i + 1] - x[i];
        let a = x[i + 1] - t;

        (m[i] * a.powi(3) + m[i + 1] * b.powi(3)) / (6.0 * h)
            + (y[i] / h - m[i] * h / 6.0) * a
            + (y[i + 1] / h - m[i + 1] * h / 6.0) * b
    }
}

/// Solves the tridiagonal system for the knot second derivatives.
fn natural_moments(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n <= 2 {
        return m;
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    for i in 1..n - 1 {
        let a = h[i - 1];
        let b = 2.0 * (h[i - 1] + h[i]);
        let c = h[i];
        let d = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        if i == 1 {
            c_prime[i] = c / b;
            d_prime[i] = d / b;
        } else {
            let denom = b - a * c_prime[i - 1];
            c_prime[i] = c / denom;
            d_prime[i] = (d - a * d_prime[i - 1]) / denom;
        }
    }

    m[n - 2] = d_prime[n - 2];
    for i in (1..n - 2).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    m
}
