use super::Optimizer;
use crate::error::{FitError, Result};
use std::f64::consts::PI;

/// Adjusts the learning rate of an optimizer once per outer optimization step.
pub trait Scheduler {
    fn advance(&mut self, optimizer: &mut dyn Optimizer);

    fn last_lr(&self) -> f64;
}

/// lr_t = lr_0 gamma^t
pub struct ExponentialLr {
    gamma: f64,
    lr: f64,
}

impl ExponentialLr {
    pub fn new(initial_lr: f64, gamma: f64) -> Self {
        ExponentialLr {
            gamma,
            lr: initial_lr,
        }
    }
}

impl Scheduler for ExponentialLr {
    fn advance(&mut self, optimizer: &mut dyn Optimizer) {
        self.lr = optimizer.learning_rate() * self.gamma;
        optimizer.set_learning_rate(self.lr);
    }

    fn last_lr(&self) -> f64 {
        self.lr
    }
}

/// lr_t = lr_0 (1 + cos(pi t / T_max)) / 2
pub struct CosineAnnealingLr {
    base_lr: f64,
    t_max: usize,
    epoch: usize,
    lr: f64,
}

impl CosineAnnealingLr {
    pub fn new(initial_lr: f64, t_max: usize) -> Self {
        CosineAnnealingLr {
            base_lr: initial_lr,
            t_max,
            epoch: 0,
            lr: initial_lr,
        }
    }
}

impl Scheduler for CosineAnnealingLr {
    fn advance(&mut self, optimizer: &mut dyn Optimizer) {
        self.epoch += 1;
        let phase: f64 = PI * self.epoch as f64 / self.t_max as f64;
        self.lr = 0.5 * self.base_lr * (1.0 + phase.cos());
        optimizer.set_learning_rate(self.lr);
    }

    fn last_lr(&self) -> f64 {
        self.lr
    }
}

/// Kind of learning-rate schedule, selected by name ("exp" or "cos").
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LrScheduler {
    Exponential { gamma: f64 },
    CosineAnnealing { t_max: usize },
}

impl LrScheduler {
    pub fn from_name(name: &str, gamma: f64, t_max: usize) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "exp" | "exponential" | "exponentiallr" => Ok(LrScheduler::Exponential { gamma }),
            "cos" | "cosine" | "cosineannealinglr" => {
                if t_max == 0 {
                    return Err(FitError::config("T_max of the cosine schedule must be > 0"));
                }
                Ok(LrScheduler::CosineAnnealing { t_max })
            }
            _ => Err(FitError::config(format!(
                "unknown learning rate scheduler '{}', available: exp, cos",
                name
            ))),
        }
    }

    pub fn build(&self, initial_lr: f64) -> Box<dyn Scheduler> {
        match *self {
            LrScheduler::Exponential { gamma } => Box::new(ExponentialLr::new(initial_lr, gamma)),
            LrScheduler::CosineAnnealing { t_max } => {
                Box::new(CosineAnnealingLr::new(initial_lr, t_max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::Sgd;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exponential_decay() {
        let mut optimizer = Sgd::new(0.1);
        let mut scheduler = LrScheduler::from_name("exp", 0.5, 0).unwrap().build(0.1);
        scheduler.advance(&mut optimizer);
        scheduler.advance(&mut optimizer);
        assert_abs_diff_eq!(optimizer.learning_rate(), 0.025, epsilon = 1e-15);
        assert_abs_diff_eq!(scheduler.last_lr(), 0.025, epsilon = 1e-15);
    }

    #[test]
    fn cosine_annealing_reaches_zero_after_t_max() {
        let mut optimizer = Sgd::new(0.2);
        let mut scheduler = LrScheduler::from_name("cos", 0.0, 4).unwrap().build(0.2);
        scheduler.advance(&mut optimizer);
        scheduler.advance(&mut optimizer);
        assert_abs_diff_eq!(optimizer.learning_rate(), 0.1, epsilon = 1e-12);
        scheduler.advance(&mut optimizer);
        scheduler.advance(&mut optimizer);
        assert_abs_diff_eq!(optimizer.learning_rate(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn unknown_scheduler_is_rejected() {
        assert!(LrScheduler::from_name("step", 0.9, 10).is_err());
        assert!(LrScheduler::from_name("cos", 0.9, 0).is_err());
    }
}
