use nalgebra::DVector;

use super::reformulated::Evaluation;

/// Relative distance by which the starting point is pushed inside its bounds.
const BOUND_PUSH: f64 = 1e-2;

/// Bound multipliers are kept within this factor of `μ / slack`.
const KAPPA_SIGMA: f64 = 1e10;

/// Scaling threshold for the optimality error.
const S_MAX: f64 = 100.0;

/// Optimality measures at one iterate.
#[derive(Debug, Clone, Copy)]
pub(super) struct Errors {
    /// Scaled overall error for the barrier problem.
    pub(super) overall: f64,
    pub(super) dual: f64,
    pub(super) primal: f64,
}

/// Primal-dual iterate over the reformulated variables.
pub(super) struct State {
    pub(super) y: DVector<f64>,
    pub(super) lambda: DVector<f64>,
    pub(super) z_lower: DVector<f64>,
    pub(super) z_upper: DVector<f64>,
    lower: DVector<f64>,
    upper: DVector<f64>,
}

impl State {
    /// Starts from `y` pushed strictly inside its bounds, with unit bound
    /// multipliers and zero constraint multipliers.
    pub(super) fn new(
        mut y: DVector<f64>,
        lower: &DVector<f64>,
        upper: &DVector<f64>,
        num_constraints: usize,
    ) -> Self {
        let n = y.len();
        for i in 0..n {
            let (l, u) = (lower[i], upper[i]);
            let push = |bound: f64| BOUND_PUSH * bound.abs().max(1.0);
            let (push_l, push_u) = if l.is_finite() && u.is_finite() {
                let half_gap = 0.5 * BOUND_PUSH * (u - l);
                (push(l).min(half_gap), push(u).min(half_gap))
            } else {
                (push(l), push(u))
            };
            if l.is_finite() {
                y[i] = y[i].max(l + push_l);
            }
            if u.is_finite() {
                y[i] = y[i].min(u - push_u);
            }
        }

        let indicator = |b: &DVector<f64>| b.map(|v| if v.is_finite() { 1.0 } else { 0.0 });
        Self {
            y,
            lambda: DVector::zeros(num_constraints),
            z_lower: indicator(lower),
            z_upper: indicator(upper),
            lower: lower.clone(),
            upper: upper.clone(),
        }
    }

    pub(super) fn has_lower(&self, i: usize) -> bool {
        self.lower[i].is_finite()
    }

    pub(super) fn has_upper(&self, i: usize) -> bool {
        self.upper[i].is_finite()
    }

    /// Distance of `y[i]` above its lower bound.
    pub(super) fn slack_lower(&self, y: &DVector<f64>, i: usize) -> f64 {
        y[i] - self.lower[i]
    }

    /// Distance of `y[i]` below its upper bound.
    pub(super) fn slack_upper(&self, y: &DVector<f64>, i: usize) -> f64 {
        self.upper[i] - y[i]
    }

    /// Primal-dual barrier Hessian term `Σ`.
    pub(super) fn sigma(&self) -> DVector<f64> {
        DVector::from_fn(self.y.len(), |i, _| {
            let mut s = 0.0;
            if self.has_lower(i) {
                s += self.z_lower[i] / self.slack_lower(&self.y, i);
            }
            if self.has_upper(i) {
                s += self.z_upper[i] / self.slack_upper(&self.y, i);
            }
            s
        })
    }

    /// Gradient of the barrier objective at the current point.
    pub(super) fn barrier_gradient(&self, gradient: &DVector<f64>, mu: f64) -> DVector<f64> {
        DVector::from_fn(self.y.len(), |i, _| {
            let mut g = gradient[i];
            if self.has_lower(i) {
                g -= mu / self.slack_lower(&self.y, i);
            }
            if self.has_upper(i) {
                g += mu / self.slack_upper(&self.y, i);
            }
            g
        })
    }

    /// Barrier objective `f - μ Σ ln(slack)` at `y`.
    ///
    /// Points on or outside a bound have infinite barrier value.
    pub(super) fn barrier_value(&self, objective: f64, y: &DVector<f64>, mu: f64) -> f64 {
        let mut value = objective;
        for i in 0..y.len() {
            for (has, slack) in [
                (self.has_lower(i), self.slack_lower(y, i)),
                (self.has_upper(i), self.slack_upper(y, i)),
            ] {
                if has {
                    if slack <= 0.0 {
                        return f64::INFINITY;
                    }
                    value -= mu * slack.ln();
                }
            }
        }
        value
    }

    /// Newton steps of the bound multipliers for a primal step `dy`.
    pub(super) fn multiplier_steps(&self, dy: &DVector<f64>, mu: f64) -> (DVector<f64>, DVector<f64>) {
        let n = self.y.len();
        let dz_lower = DVector::from_fn(n, |i, _| {
            if self.has_lower(i) {
                let s = self.slack_lower(&self.y, i);
                mu / s - self.z_lower[i] - self.z_lower[i] / s * dy[i]
            } else {
                0.0
            }
        });
        let dz_upper = DVector::from_fn(n, |i, _| {
            if self.has_upper(i) {
                let s = self.slack_upper(&self.y, i);
                mu / s - self.z_upper[i] + self.z_upper[i] / s * dy[i]
            } else {
                0.0
            }
        });
        (dz_lower, dz_upper)
    }

    /// Largest primal and dual step lengths keeping a `tau` fraction of the
    /// distance to the bounds.
    pub(super) fn max_steps(
        &self,
        dy: &DVector<f64>,
        dz_lower: &DVector<f64>,
        dz_upper: &DVector<f64>,
        tau: f64,
    ) -> (f64, f64) {
        let mut primal: f64 = 1.0;
        let mut dual: f64 = 1.0;
        for i in 0..self.y.len() {
            if self.has_lower(i) {
                if dy[i] < 0.0 {
                    primal = primal.min(-tau * self.slack_lower(&self.y, i) / dy[i]);
                }
                if dz_lower[i] < 0.0 {
                    dual = dual.min(-tau * self.z_lower[i] / dz_lower[i]);
                }
            }
            if self.has_upper(i) {
                if dy[i] > 0.0 {
                    primal = primal.min(tau * self.slack_upper(&self.y, i) / dy[i]);
                }
                if dz_upper[i] < 0.0 {
                    dual = dual.min(-tau * self.z_upper[i] / dz_upper[i]);
                }
            }
        }
        (primal, dual)
    }

    /// Moves the bound multipliers and keeps each within a band around
    /// `μ / slack`.
    pub(super) fn update_multipliers(
        &mut self,
        dz_lower: &DVector<f64>,
        dz_upper: &DVector<f64>,
        alpha: f64,
        mu: f64,
    ) {
        self.z_lower.axpy(alpha, dz_lower, 1.0);
        self.z_upper.axpy(alpha, dz_upper, 1.0);
        for i in 0..self.y.len() {
            if self.has_lower(i) {
                let s = self.slack_lower(&self.y, i);
                self.z_lower[i] = self.z_lower[i]
                    .min(KAPPA_SIGMA * mu / s)
                    .max(mu / (KAPPA_SIGMA * s));
            }
            if self.has_upper(i) {
                let s = self.slack_upper(&self.y, i);
                self.z_upper[i] = self.z_upper[i]
                    .min(KAPPA_SIGMA * mu / s)
                    .max(mu / (KAPPA_SIGMA * s));
            }
        }
    }

    /// Optimality error of the barrier problem with parameter `mu`.
    ///
    /// Pass `mu = 0` for the error of the original problem.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn errors(&self, eval: &Evaluation, mu: f64) -> Errors {
        let residual =
            &eval.gradient + eval.jacobian.tr_mul(&self.lambda) - &self.z_lower + &self.z_upper;
        let dual = residual.amax();
        let primal = eval.constraints.amax();

        let mut complementarity: f64 = 0.0;
        for i in 0..self.y.len() {
            if self.has_lower(i) {
                let gap = self.slack_lower(&self.y, i) * self.z_lower[i] - mu;
                complementarity = complementarity.max(gap.abs());
            }
            if self.has_upper(i) {
                let gap = self.slack_upper(&self.y, i) * self.z_upper[i] - mu;
                complementarity = complementarity.max(gap.abs());
            }
        }

        let n = self.y.len();
        let m = self.lambda.len();
        let multipliers = self.lambda.lp_norm(1) + self.z_lower.lp_norm(1) + self.z_upper.lp_norm(1);
        let s_d = (multipliers / (m + 2 * n).max(1) as f64).max(S_MAX) / S_MAX;

        Errors {
            overall: (dual / s_d).max(primal).max(complementarity / s_d),
            dual,
            primal,
        }
    }
}
