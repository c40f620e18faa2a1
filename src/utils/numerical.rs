use ndarray::prelude::*;

/// Derivative of `function` at `origin` along the coordinate `index` by Ridders' method
/// (C. J. F. Ridders, Adv. Eng. Software 4, 75 (1982)). `stepsize` is the initial step and
/// should be an increment over which the function changes substantially. Returns the
/// estimate and its error.
fn ridders_method<F>(
    function: F,
    origin: &Array1<f64>,
    index: usize,
    stepsize: f64,
    con: f64,
    safe: f64,
    maxiter: usize,
) -> (f64, f64)
where
    F: Fn(Array1<f64>) -> f64,
{
    let mut stepsize: f64 = stepsize;
    let mut step: Array1<f64> = Array1::zeros(origin.len());
    step[index] = 1.0;
    let con2: f64 = con.powi(2);
    let central = |h: f64| -> f64 {
        (function(origin + &(&step * h)) - function(origin - &(&step * h))) / (2.0 * h)
    };

    let mut table: Vec<Vec<f64>> = vec![vec![central(stepsize)]];
    let mut error: f64 = f64::INFINITY;
    let mut estimate: f64 = table[0][0];

    for i in 1..maxiter {
        stepsize /= con;
        table.push(vec![central(stepsize)]);

        // Neville extrapolation to zero step size, no new function calls
        let mut fac: f64 = con2;
        for j in 1..=i {
            let next: f64 = (table[i][j - 1] * fac - table[i - 1][j - 1]) / (fac - 1.0);
            table[i].push(next);
            fac *= con2;
            let current_error: f64 = (table[i][j] - table[i][j - 1])
                .abs()
                .max((table[i][j] - table[i - 1][j - 1]).abs());
            if current_error <= error {
                error = current_error;
                estimate = table[i][j];
            }
        }
        // stop if the higher order is worse by a significant factor
        if (table[i][i] - table[i - 1][i - 1]).abs() >= safe * error {
            break;
        }
    }
    (estimate, error)
}

/// Compares an analytic gradient with Ridders' finite differences at `origin`. `tol` is
/// the allowed deviation relative to the magnitude of the derivative (absolute below 1).
pub fn assert_deriv<F, G>(function: F, gradient: G, origin: Array1<f64>, stepsize: f64, tol: f64)
where
    F: Fn(Array1<f64>) -> f64,
    G: Fn(Array1<f64>) -> Array1<f64>,
{
    assert!(stepsize > 0.0, "The stepsize has to be > 0.0, but it is {}", stepsize);
    let analytic_grad: Array1<f64> = gradient(origin.clone());
    let mut failed: Vec<usize> = Vec::new();

    println!(
        "{: <5} {: >18} {: >18} {: >18}",
        "Index", "Analytic", "Numerical", "Error"
    );
    for i in 0..origin.len() {
        let (numerical, deriv_error) = ridders_method(&function, &origin, i, stepsize, 1.4, 2.0, 15);
        let analytic: f64 = analytic_grad[i];
        println!(
            "{: >5} {:>18.12} {:>18.12} {:>18.12}",
            i, analytic, numerical, deriv_error
        );
        if (analytic - numerical).abs() > tol * numerical.abs().max(1.0) {
            failed.push(i);
        }
    }
    assert!(failed.is_empty(), "Gradient test failed for indices {:?}", failed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_deriv_simple_function() {
        let data: Array1<f64> = array![1.0, 2.0, 3.0, 4.0];
        assert_deriv(
            |x: Array1<f64>| x.iter().map(|v| v.powi(2)).sum(),
            |x: Array1<f64>| 2.0 * x,
            data,
            0.01,
            1e-10,
        );
    }
}
