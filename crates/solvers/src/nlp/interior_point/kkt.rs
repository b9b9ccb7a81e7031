use nalgebra::{DMatrix, DVector};

/// Constraint regularization placed on the lower-right KKT block.
const DELTA_C: f64 = 1e-8;

/// Largest Hessian regularization tried before giving up.
const DELTA_MAX: f64 = 1e40;

/// A regularized primal-dual system ready to solve.
pub(super) struct Kkt {
    /// `W + Σ + δI`.
    pub(super) h: DMatrix<f64>,

    /// The Hessian regularization `δ` that was applied.
    pub(super) delta: f64,
}

impl Kkt {
    /// Regularizes the Hessian block until the system has the inertia of a
    /// minimizer.
    ///
    /// The inertia is correct exactly when `W + Σ + δI + AᵀA/δc` is positive
    /// definite, which is tested by Cholesky factorization. Returns `None` if
    /// no acceptable `δ` is found.
    pub(super) fn regularize(
        w: &DMatrix<f64>,
        sigma: &DVector<f64>,
        a: &DMatrix<f64>,
        delta_prev: f64,
    ) -> Option<Self> {
        let base = w + DMatrix::from_diagonal(sigma);
        let penalty = a.tr_mul(a) / DELTA_C;

        let mut delta: f64 = 0.0;
        loop {
            let mut h = base.clone();
            for i in 0..h.nrows() {
                h[(i, i)] += delta;
            }
            if (&h + &penalty).cholesky().is_some() {
                return Some(Self { h, delta });
            }

            delta = if delta == 0.0 {
                if delta_prev == 0.0 {
                    1e-4
                } else {
                    (delta_prev / 3.0).max(1e-20)
                }
            } else {
                8.0 * delta
            };
            if delta > DELTA_MAX {
                return None;
            }
        }
    }

    /// Solves
    ///
    /// ```text
    /// [ H   Aᵀ  ] [dy]   = -[r_dual]
    /// [ A  -δc I] [dλ]      [c     ]
    /// ```
    ///
    /// by LU factorization, returning `(dy, dλ)`.
    pub(super) fn solve(
        &self,
        a: &DMatrix<f64>,
        r_dual: &DVector<f64>,
        c: &DVector<f64>,
    ) -> Option<(DVector<f64>, DVector<f64>)> {
        let n = self.h.nrows();
        let m = a.nrows();

        let mut k = DMatrix::zeros(n + m, n + m);
        k.view_mut((0, 0), (n, n)).copy_from(&self.h);
        k.view_mut((n, 0), (m, n)).copy_from(a);
        k.view_mut((0, n), (n, m)).copy_from(&a.transpose());
        for r in 0..m {
            k[(n + r, n + r)] = -DELTA_C;
        }

        let mut rhs = DVector::zeros(n + m);
        rhs.rows_mut(0, n).copy_from(&(-r_dual));
        rhs.rows_mut(n, m).copy_from(&(-c));

        let sol = k.lu().solve(&rhs)?;
        if sol.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some((sol.rows(0, n).into_owned(), sol.rows(n, m).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn convex_systems_need_no_regularization() {
        let w = DMatrix::identity(2, 2);
        let sigma = DVector::zeros(2);
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let kkt = Kkt::regularize(&w, &sigma, &a, 0.0).unwrap();
        assert_eq!(kkt.delta, 0.0);

        // min ½|y|² + r·y  s.t.  y0 + y1 = 1 from the origin.
        let r = DVector::from_vec(vec![0.0, 0.0]);
        let c = DVector::from_vec(vec![-1.0]);
        let (dy, dl) = kkt.solve(&a, &r, &c).unwrap();
        assert_relative_eq!(dy[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(dy[1], 0.5, epsilon = 1e-6);
        assert_relative_eq!(dl[0], -0.5, epsilon = 1e-6);
    }

    #[test]
    fn negative_curvature_is_regularized() {
        let w = DMatrix::from_diagonal(&DVector::from_vec(vec![-1.0, 2.0]));
        let sigma = DVector::zeros(2);
        let a = DMatrix::zeros(0, 2);
        let kkt = Kkt::regularize(&w, &sigma, &a, 0.0).unwrap();
        assert!(kkt.delta > 1.0);
        assert!(kkt.h.clone().cholesky().is_some());
    }

    #[test]
    fn curvature_along_constraints_is_ignored() {
        // Negative curvature only in the direction the constraint pins.
        let w = DMatrix::from_diagonal(&DVector::from_vec(vec![-1.0, 1.0]));
        let sigma = DVector::zeros(2);
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let kkt = Kkt::regularize(&w, &sigma, &a, 0.0).unwrap();
        assert_eq!(kkt.delta, 0.0);
    }
}
