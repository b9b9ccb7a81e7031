use tracing::{debug, trace};
use trellis_core::Observer;

use crate::nlp::{Action, Error, NlpProblem, NlpSolution, Progress, Status};

use super::{
    Config,
    kkt::Kkt,
    reformulated::{Evaluation, Reformulated},
    state::State,
};

/// Armijo sufficient-decrease constant.
const ETA: f64 = 1e-4;

/// Smallest step length tried by the line search.
const ALPHA_MIN: f64 = 1e-14;

/// Penalty parameter safety margin in the merit update.
const RHO: f64 = 0.1;

/// Core interior-point iteration.
pub(super) fn search<P, Obs>(
    problem: &P,
    x0: &[f64],
    config: &Config,
    mut observer: Obs,
) -> Result<NlpSolution, Error>
where
    P: NlpProblem,
    Obs: Observer<Progress, Action>,
{
    let nlp = Reformulated::new(problem, x0)?;
    let y0 = nlp.initial_point().map_err(Error::problem)?;
    let mut state = State::new(y0, nlp.lower(), nlp.upper(), nlp.m());
    let mut eval = nlp.evaluate(&state.y).map_err(Error::problem)?;

    debug!(
        variables = nlp.n(),
        constraints = nlp.m(),
        fixed = problem.num_variables() - nlp.num_free(),
        "interior point start"
    );

    let tol = config.tol();
    let mut mu = config.mu_init();
    let mut nu = 1.0;
    let mut delta_prev = 0.0;
    let mut step = 0.0;

    let finish = |state: &State, eval: &Evaluation, status: Status, iter: usize, message: String| {
        debug!(?status, iterations = iter, objective = eval.objective, "interior point finished");
        NlpSolution {
            x: nlp.expand(&state.y),
            objective: eval.objective,
            status,
            iterations: iter,
            message,
        }
    };

    let mut iter = 0;
    loop {
        let errors = state.errors(&eval, 0.0);
        trace!(
            iter,
            objective = eval.objective,
            primal = errors.primal,
            dual = errors.dual,
            error = errors.overall,
            mu,
            step,
            delta = delta_prev,
            "iteration"
        );

        let progress = Progress {
            iter,
            objective: eval.objective,
            primal_infeasibility: errors.primal,
            dual_infeasibility: errors.dual,
            barrier: mu,
            step,
            regularization: delta_prev,
        };
        if let Some(Action::StopEarly) = observer.observe(&progress) {
            let message = format!("stopped by observer after {iter} iterations");
            return Ok(finish(&state, &eval, Status::StoppedByObserver, iter, message));
        }

        if errors.overall <= tol && errors.primal <= config.constr_viol_tol() {
            let message = format!("converged to tolerance {tol:e} in {iter} iterations");
            return Ok(finish(&state, &eval, Status::Converged, iter, message));
        }
        if iter == config.max_iters() {
            let message = format!("reached the iteration limit of {iter}");
            return Ok(finish(&state, &eval, Status::MaxIters, iter, message));
        }

        // Monotone barrier update.
        while mu > tol / 10.0 && state.errors(&eval, mu).overall <= 10.0 * mu {
            mu = (tol / 10.0).max((0.2 * mu).min(mu.powf(1.5)));
        }

        let w = match nlp.hessian(&state.y, &state.lambda) {
            Ok(w) => w,
            Err(err) => {
                let message = format!("problem error while differentiating: {err}");
                return Ok(finish(&state, &eval, Status::Error, iter, message));
            }
        };
        let Some(kkt) = Kkt::regularize(&w, &state.sigma(), &eval.jacobian, delta_prev) else {
            let message = "could not regularize the KKT system".to_owned();
            return Ok(finish(&state, &eval, Status::Error, iter, message));
        };
        delta_prev = kkt.delta;

        let grad_phi = state.barrier_gradient(&eval.gradient, mu);
        let r_dual = &grad_phi + eval.jacobian.tr_mul(&state.lambda);
        let Some((dy, dlambda)) = kkt.solve(&eval.jacobian, &r_dual, &eval.constraints) else {
            let message = "KKT system is singular".to_owned();
            return Ok(finish(&state, &eval, Status::Error, iter, message));
        };

        let (dz_lower, dz_upper) = state.multiplier_steps(&dy, mu);
        let tau = (1.0 - mu).max(0.99);
        let (alpha_max, alpha_z) = state.max_steps(&dy, &dz_lower, &dz_upper, tau);

        // ℓ1 merit function with an adaptive penalty on the constraints.
        let c_norm = eval.constraints.lp_norm(1);
        let slope = grad_phi.dot(&dy);
        if c_norm > 0.0 {
            let curvature = dy.dot(&(&kkt.h * &dy)).max(0.0);
            let trial = (slope + 0.5 * curvature) / ((1.0 - RHO) * c_norm);
            if nu < trial {
                nu = trial + 1.0;
            }
        }
        let merit = state.barrier_value(eval.objective, &state.y, mu) + nu * c_norm;
        let decrease = slope - nu * c_norm;
        let tiny = dy
            .iter()
            .zip(state.y.iter())
            .all(|(d, y)| d.abs() <= 10.0 * f64::EPSILON * (1.0 + y.abs()));

        let mut alpha = alpha_max;
        let accepted = loop {
            let trial_y = &state.y + &dy * alpha;
            if tiny {
                break Some(trial_y);
            }
            let trial_merit = nlp
                .objective(&trial_y)
                .and_then(|f| Ok((f, nlp.constraints(&trial_y)?)))
                .map_or(f64::INFINITY, |(f, c)| {
                    state.barrier_value(f, &trial_y, mu) + nu * c.lp_norm(1)
                });
            if trial_merit <= merit + ETA * alpha * decrease {
                break Some(trial_y);
            }
            alpha *= 0.5;
            if alpha < ALPHA_MIN {
                break None;
            }
        };

        let Some(new_y) = accepted else {
            let errors = state.errors(&eval, 0.0);
            let (status, message) = if errors.primal > config.constr_viol_tol() {
                (
                    Status::Infeasible,
                    format!(
                        "line search failed with constraint violation {:e}",
                        errors.primal
                    ),
                )
            } else {
                (Status::Error, "line search failed to make progress".to_owned())
            };
            return Ok(finish(&state, &eval, status, iter, message));
        };

        // The last good point is returned if the accepted one cannot be evaluated.
        let new_eval = match nlp.evaluate(&new_y) {
            Ok(eval) => eval,
            Err(err) => {
                let message = format!("problem error at iteration {}: {err}", iter + 1);
                return Ok(finish(&state, &eval, Status::Error, iter, message));
            }
        };

        state.y = new_y;
        state.lambda.axpy(alpha, &dlambda, 1.0);
        state.update_multipliers(&dz_lower, &dz_upper, alpha_z, mu);
        step = alpha;
        eval = new_eval;
        iter += 1;
    }
}
