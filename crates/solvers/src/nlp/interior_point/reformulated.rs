use nalgebra::{DMatrix, DVector};

use crate::nlp::{Error, NlpProblem};

/// How a constraint row enters the reformulated problem.
#[derive(Debug, Clone, Copy)]
enum Row {
    /// `g(x) - target = 0`.
    Equality(f64),

    /// `g(x) - s = 0` with the slack at this position in `y`.
    Slack(usize),
}

/// The problem as the iteration sees it.
///
/// Fixed variables are removed and every inequality row gains a slack
/// variable, leaving equality constraints plus variable bounds. The
/// reformulated variables are `y = [free variables, slacks]`.
pub(super) struct Reformulated<'p, P> {
    problem: &'p P,
    base: Vec<f64>,
    free: Vec<usize>,
    rows: Vec<Row>,
    lower: DVector<f64>,
    upper: DVector<f64>,
}

/// Problem functions evaluated at one reformulated point.
pub(super) struct Evaluation {
    pub(super) objective: f64,
    pub(super) gradient: DVector<f64>,
    pub(super) constraints: DVector<f64>,
    pub(super) jacobian: DMatrix<f64>,
}

impl<'p, P: NlpProblem> Reformulated<'p, P> {
    /// Checks the problem's dimensions and bounds and builds the reformulation.
    pub(super) fn new(problem: &'p P, x0: &[f64]) -> Result<Self, Error> {
        let n = problem.num_variables();
        let m = problem.num_constraints();
        let var_bounds = problem.variable_bounds();
        let con_bounds = problem.constraint_bounds();

        Error::check_len("variable bounds", n, var_bounds.len())?;
        Error::check_len("constraint bounds", m, con_bounds.len())?;
        Error::check_len("initial values", n, x0.len())?;
        let (rows, cols) = problem.jacobian_structure().shape();
        Error::check_len("Jacobian rows", m, rows)?;
        Error::check_len("Jacobian columns", n, cols)?;

        for (i, b) in var_bounds.iter().enumerate() {
            b.check(format!("variable {i}"))?;
        }
        for (r, b) in con_bounds.iter().enumerate() {
            b.check(format!("constraint {r}"))?;
        }

        let mut base = x0.to_vec();
        let mut free = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n + m);
        let mut upper = Vec::with_capacity(n + m);
        for (i, b) in var_bounds.iter().enumerate() {
            if b.is_fixed() {
                base[i] = b.lower;
            } else {
                free.push(i);
                lower.push(b.lower);
                upper.push(b.upper);
            }
        }

        let mut row_kinds = Vec::with_capacity(m);
        for b in con_bounds {
            if b.is_fixed() {
                row_kinds.push(Row::Equality(b.lower));
            } else {
                row_kinds.push(Row::Slack(lower.len()));
                lower.push(b.lower);
                upper.push(b.upper);
            }
        }

        Ok(Self {
            problem,
            base,
            free,
            rows: row_kinds,
            lower: DVector::from_vec(lower),
            upper: DVector::from_vec(upper),
        })
    }

    /// Number of reformulated variables.
    pub(super) fn n(&self) -> usize {
        self.lower.len()
    }

    /// Number of equality constraints.
    pub(super) fn m(&self) -> usize {
        self.rows.len()
    }

    /// Number of leading entries of `y` that are original variables.
    pub(super) fn num_free(&self) -> usize {
        self.free.len()
    }

    pub(super) fn lower(&self) -> &DVector<f64> {
        &self.lower
    }

    pub(super) fn upper(&self) -> &DVector<f64> {
        &self.upper
    }

    /// Maps a reformulated point back to the original variables.
    pub(super) fn expand(&self, y: &DVector<f64>) -> Vec<f64> {
        let mut x = self.base.clone();
        for (j, &i) in self.free.iter().enumerate() {
            x[i] = y[j];
        }
        x
    }

    /// Builds the starting point from the initial values, with each slack at
    /// its constraint value.
    pub(super) fn initial_point(&self) -> Result<DVector<f64>, P::Error> {
        let mut y = DVector::zeros(self.n());
        for (j, &i) in self.free.iter().enumerate() {
            y[j] = self.base[i];
        }
        let g = self.raw_constraints(&self.base)?;
        for (row, kind) in self.rows.iter().enumerate() {
            if let Row::Slack(j) = *kind {
                y[j] = g[row];
            }
        }
        Ok(y)
    }

    pub(super) fn objective(&self, y: &DVector<f64>) -> Result<f64, P::Error> {
        self.problem.objective(&self.expand(y))
    }

    pub(super) fn gradient(&self, y: &DVector<f64>) -> Result<DVector<f64>, P::Error> {
        let x = self.expand(y);
        let mut full = vec![0.0; x.len()];
        self.problem.gradient(&x, &mut full)?;

        let mut grad = DVector::zeros(self.n());
        for (j, &i) in self.free.iter().enumerate() {
            grad[j] = full[i];
        }
        Ok(grad)
    }

    fn raw_constraints(&self, x: &[f64]) -> Result<Vec<f64>, P::Error> {
        let mut g = vec![0.0; self.m()];
        self.problem.constraints(x, &mut g)?;
        Ok(g)
    }

    /// Evaluates the equality residuals `c(y)`.
    pub(super) fn constraints(&self, y: &DVector<f64>) -> Result<DVector<f64>, P::Error> {
        let g = self.raw_constraints(&self.expand(y))?;
        Ok(DVector::from_iterator(
            self.m(),
            g.iter().zip(&self.rows).map(|(value, kind)| match *kind {
                Row::Equality(target) => value - target,
                Row::Slack(j) => value - y[j],
            }),
        ))
    }

    /// Evaluates the dense Jacobian of `c(y)`.
    pub(super) fn jacobian(&self, y: &DVector<f64>) -> Result<DMatrix<f64>, P::Error> {
        let x = self.expand(y);
        let structure = self.problem.jacobian_structure();
        let mut values = vec![0.0; structure.nnz()];
        self.problem.jacobian(&x, &mut values)?;

        let mut position = vec![None; x.len()];
        for (j, &i) in self.free.iter().enumerate() {
            position[i] = Some(j);
        }

        let mut jac = DMatrix::zeros(self.m(), self.n());
        for (&(row, col), value) in structure.entries().iter().zip(&values) {
            if let Some(j) = position[col] {
                jac[(row, j)] += value;
            }
        }
        for (row, kind) in self.rows.iter().enumerate() {
            if let Row::Slack(j) = *kind {
                jac[(row, j)] = -1.0;
            }
        }
        Ok(jac)
    }

    /// Evaluates every function the step computation needs.
    pub(super) fn evaluate(&self, y: &DVector<f64>) -> Result<Evaluation, P::Error> {
        Ok(Evaluation {
            objective: self.objective(y)?,
            gradient: self.gradient(y)?,
            constraints: self.constraints(y)?,
            jacobian: self.jacobian(y)?,
        })
    }

    /// Gradient of the Lagrangian `f + λᵀc` with respect to `y`.
    pub(super) fn lagrangian_gradient(
        &self,
        y: &DVector<f64>,
        lambda: &DVector<f64>,
    ) -> Result<DVector<f64>, P::Error> {
        Ok(self.gradient(y)? + self.jacobian(y)?.tr_mul(lambda))
    }

    /// Approximates the Lagrangian Hessian by central differences.
    ///
    /// Slacks enter linearly, so only the columns of free variables are
    /// differenced.
    pub(super) fn hessian(
        &self,
        y: &DVector<f64>,
        lambda: &DVector<f64>,
    ) -> Result<DMatrix<f64>, P::Error> {
        let n = self.n();
        let mut w = DMatrix::zeros(n, n);
        for j in 0..self.num_free() {
            let h = 1e-4 * y[j].abs().max(1.0);
            let mut plus = y.clone();
            plus[j] += h;
            let mut minus = y.clone();
            minus[j] -= h;
            let column = (self.lagrangian_gradient(&plus, lambda)?
                - self.lagrangian_gradient(&minus, lambda)?)
                / (2.0 * h);
            w.set_column(j, &column);
        }
        Ok((&w + w.transpose()) * 0.5)
    }
}
