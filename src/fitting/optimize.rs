use super::{Dftb2Nnsk, FormulaModel};
use crate::defaults::*;
use crate::error::{FitError, Result};
use crate::fitting::sampling::truncated_normal;
use crate::formula::NUM_PARAS;
use crate::io::TrainOptions;
use crate::optim::{optimizer_by_name, LrScheduler, Objective, Optimizer, Scheduler};
use crate::reference::{DftbReference, Integral};
use crate::utils::Timer;
use log::{info, warn};
use ndarray::prelude::*;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// Options of [`Dftb2Nnsk::optimize`].
/// Usage: let options = OptimizeOptionsBuilder::new().[set_xx].build();
#[derive(Clone, Debug)]
pub struct OptimizeOptions {
    pub(crate) r_min: Option<f64>,
    pub(crate) r_max: Option<f64>,
    pub(crate) nsample: usize,
    pub(crate) nstep: usize,
    pub(crate) lr: f64,
    pub(crate) dis_freq: usize,
    pub(crate) method: String,
    pub(crate) max_elmt_batch: usize,
    pub(crate) lr_scheduler: LrScheduler,
    pub(crate) save_freq: usize,
    pub(crate) checkpoint_dir: Option<PathBuf>,
}

pub struct OptimizeOptionsBuilder {
    options: OptimizeOptions,
}

impl OptimizeOptionsBuilder {
    pub fn new() -> OptimizeOptionsBuilder {
        OptimizeOptionsBuilder {
            options: OptimizeOptions {
                r_min: None,
                r_max: None,
                nsample: NSAMPLE,
                nstep: NSTEP,
                lr: LEARNING_RATE,
                dis_freq: DISPLAY_FREQUENCY,
                method: String::from(OPTIMIZER),
                max_elmt_batch: MAX_ELMT_BATCH,
                lr_scheduler: LrScheduler::Exponential {
                    gamma: LR_DECAY_GAMMA,
                },
                save_freq: SAVE_FREQUENCY,
                checkpoint_dir: None,
            },
        }
    }

    /// Starts from the training options of the configuration file.
    pub fn from_train_options(train: &TrainOptions) -> Result<OptimizeOptionsBuilder> {
        let mut builder = OptimizeOptionsBuilder::new();
        builder
            .set_nstep(train.nstep)
            .set_nsample(train.nsample)
            .set_dis_freq(train.dis_freq)
            .set_save_freq(train.save_freq)
            .set_max_elmt_batch(train.max_elmt_batch)
            .set_method(&train.optimizer.kind)
            .set_lr(train.optimizer.lr)
            .set_lr_scheduler(LrScheduler::from_name(
                &train.lr_scheduler.kind,
                train.lr_scheduler.gamma,
                train.lr_scheduler.t_max,
            )?);
        if let Some(r_min) = train.r_min {
            builder.set_r_min(r_min);
        }
        if let Some(r_max) = train.r_max {
            builder.set_r_max(r_max);
        }
        Ok(builder)
    }

    pub fn set_r_min(&mut self, r_min: f64) -> &mut Self {
        self.options.r_min = Some(r_min);
        self
    }

    pub fn set_r_max(&mut self, r_max: f64) -> &mut Self {
        self.options.r_max = Some(r_max);
        self
    }

    pub fn set_nsample(&mut self, nsample: usize) -> &mut Self {
        self.options.nsample = nsample;
        self
    }

    pub fn set_nstep(&mut self, nstep: usize) -> &mut Self {
        self.options.nstep = nstep;
        self
    }

    pub fn set_lr(&mut self, lr: f64) -> &mut Self {
        self.options.lr = lr;
        self
    }

    pub fn set_dis_freq(&mut self, dis_freq: usize) -> &mut Self {
        self.options.dis_freq = dis_freq;
        self
    }

    pub fn set_method(&mut self, method: &str) -> &mut Self {
        self.options.method = String::from(method);
        self
    }

    pub fn set_max_elmt_batch(&mut self, max_elmt_batch: usize) -> &mut Self {
        self.options.max_elmt_batch = max_elmt_batch;
        self
    }

    pub fn set_lr_scheduler(&mut self, lr_scheduler: LrScheduler) -> &mut Self {
        self.options.lr_scheduler = lr_scheduler;
        self
    }

    pub fn set_save_freq(&mut self, save_freq: usize) -> &mut Self {
        self.options.save_freq = save_freq;
        self
    }

    pub fn set_checkpoint_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Self {
        self.options.checkpoint_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn build(&self) -> OptimizeOptions {
        self.options.clone()
    }
}

impl Default for OptimizeOptionsBuilder {
    fn default() -> Self {
        OptimizeOptionsBuilder::new()
    }
}

/// Composite loss MAE(H) + RMSE(H) + w (RMSE(S) + MAE(S)) and the derivatives with
/// respect to the predicted hopping and overlap integrals.
pub(crate) fn composite_loss(
    hopping: ArrayView3<f64>,
    hopping_ref: ArrayView3<f64>,
    overlap: ArrayView3<f64>,
    overlap_ref: ArrayView3<f64>,
) -> (f64, Array3<f64>, Array3<f64>) {
    let (loss_h, grad_h) = mae_plus_rmse(hopping, hopping_ref, 1.0);
    let (loss_s, grad_s) = mae_plus_rmse(overlap, overlap_ref, OVERLAP_LOSS_WEIGHT);
    (loss_h + loss_s, grad_h, grad_s)
}

/// weight * (mean |x - y| + sqrt(mean (x - y)^2)) and its derivative with respect to x.
/// The derivative of |d| and of the root at zero is taken as zero.
fn mae_plus_rmse(
    prediction: ArrayView3<f64>,
    reference: ArrayView3<f64>,
    weight: f64,
) -> (f64, Array3<f64>) {
    let n: f64 = prediction.len().max(1) as f64;
    let diff: Array3<f64> = &prediction - &reference;
    let mae: f64 = diff.iter().map(|d| d.abs()).sum::<f64>() / n;
    let rmse: f64 = (diff.iter().map(|d| d * d).sum::<f64>() / n).sqrt();
    let grad: Array3<f64> = diff.mapv(|d| {
        let dmae: f64 = if d > 0.0 {
            1.0
        } else if d < 0.0 {
            -1.0
        } else {
            0.0
        };
        let drmse: f64 = if rmse > 0.0 { d / rmse } else { 0.0 };
        weight * (dmae + drmse) / n
    });
    (weight * (mae + rmse), grad)
}

/// Loss of a batch of bond types for a flat parameter vector that holds the hopping
/// parameters followed by the overlap parameters.
struct BatchLoss<'a> {
    model: FormulaModel<'a>,
    reference: &'a DftbReference,
    shape: (usize, usize, usize),
}

impl<'a> BatchLoss<'a> {
    fn loss_and_grad(
        &self,
        flat: ArrayView1<f64>,
        bonds: &[usize],
        distances: ArrayView2<f64>,
    ) -> Result<(f64, Array1<f64>)> {
        let size: usize = self.shape.0 * self.shape.1 * self.shape.2;
        if flat.len() != 2 * size {
            return Err(FitError::shape("flat parameter vector", 2 * size, flat.len()));
        }
        let hopping: ArrayView3<f64> = flat
            .slice_move(s![..size])
            .into_shape(self.shape)
            .map_err(|err| FitError::config(format!("hopping parameters: {}", err)))?;
        let overlap: ArrayView3<f64> = flat
            .slice_move(s![size..])
            .into_shape(self.shape)
            .map_err(|err| FitError::config(format!("overlap parameters: {}", err)))?;

        let (h_fit, dh) = self.model.integrals_with_grad(hopping, bonds, distances);
        let (s_fit, ds) = self.model.integrals_with_grad(overlap, bonds, distances);
        let h_ref: Array3<f64> = self
            .reference
            .evaluate_samples(distances, bonds, Integral::Hopping)?;
        let s_ref: Array3<f64> = self
            .reference
            .evaluate_samples(distances, bonds, Integral::Overlap)?;
        let (loss, grad_h, grad_s) = composite_loss(h_fit.view(), h_ref.view(), s_fit.view(), s_ref.view());

        // chain rule, parameters of bond types outside of the batch get a zero gradient
        let mut grad: Array1<f64> = Array1::zeros(2 * size);
        {
            let (grad_hopping, grad_overlap) = grad.view_mut().split_at(Axis(0), size);
            accumulate_gradient(grad_hopping, grad_h.view(), dh.view(), bonds, self.shape)?;
            accumulate_gradient(grad_overlap, grad_s.view(), ds.view(), bonds, self.shape)?;
        }
        Ok((loss, grad))
    }
}

/// Adds dL/dp = sum_samples dL/dh * dh/dp to the gradient of the parameter tensor
/// `[n_bond_types, n_channels, NUM_PARAS]` stored in the flat `block`.
fn accumulate_gradient(
    block: ArrayViewMut1<f64>,
    dloss: ArrayView3<f64>,
    jacobian: ArrayView4<f64>,
    bonds: &[usize],
    shape: (usize, usize, usize),
) -> Result<()> {
    let mut block: ArrayViewMut3<f64> = block
        .into_shape(shape)
        .map_err(|err| FitError::config(format!("parameter gradient: {}", err)))?;
    for (i, bond) in bonds.iter().enumerate() {
        for (dl_sample, jac_sample) in dloss
            .index_axis(Axis(0), i)
            .outer_iter()
            .zip(jacobian.index_axis(Axis(0), i).outer_iter())
        {
            for (c, (dl, jac)) in dl_sample.iter().zip(jac_sample.outer_iter()).enumerate() {
                block.slice_mut(s![*bond, c, ..]).scaled_add(*dl, &jac);
            }
        }
    }
    Ok(())
}

impl Dftb2Nnsk {
    /// Fits the parameters to the reference integrals. Every step visits all bond types
    /// in random batches of at most `max_elmt_batch^2` bond types. For each batch the
    /// distances are sampled from a truncated normal distribution on `[r_min, r_max]`,
    /// or on the tabulated range of each bond type if neither is given.
    /// Every `dis_freq` steps the loss of the last batch of the step is logged together
    /// with the learning rate that the following step will use, i.e. after the decay.
    /// The loss of the last batch of the final step is kept, see [`Dftb2Nnsk::last_loss`].
    pub fn optimize(&mut self, options: &OptimizeOptions) -> Result<bool> {
        if options.max_elmt_batch < 1 {
            return Err(FitError::config("max_elmt_batch has to be at least 1"));
        }
        if options.nsample < 1 {
            return Err(FitError::config("nsample has to be at least 1"));
        }
        let n_bonds: usize = self.index().n_bond_types();
        let ranges: Vec<(f64, f64)> = match (options.r_min, options.r_max) {
            (Some(r_min), Some(r_max)) => vec![(r_min, r_max); n_bonds],
            (None, None) => self.bond_ranges.clone().ok_or_else(|| {
                FitError::config(
                    "r_min and r_max are required unless the distance ranges are taken \
                     from the reference data (cal_rcuts = true)",
                )
            })?,
            _ => {
                return Err(FitError::config(
                    "r_min and r_max have to be given together",
                ))
            }
        };
        if let Some((r_min, r_max)) = ranges.iter().find(|(r_min, r_max)| !(r_min <= r_max)) {
            return Err(FitError::config(format!(
                "invalid distance range [{}, {}]",
                r_min, r_max
            )));
        }
        let mut optimizer: Box<dyn Optimizer> = optimizer_by_name(&options.method, options.lr)?;
        let mut scheduler: Box<dyn Scheduler> = options.lr_scheduler.build(options.lr);
        if options.nstep == 0 {
            return Ok(true);
        }

        let batch_size: usize = options.max_elmt_batch.saturating_pow(2).min(n_bonds);
        let shape: (usize, usize, usize) = self.hopping_params.dim();
        let timer: Timer = Timer::start();

        info!("{:^80}", "");
        info!("{: ^80}", "Fit of the Slater-Koster parameters");
        info!("{:-^80}", "");
        info!("{: <25} {}", "optimizer:", optimizer.name());
        info!("{: <25} {}", "bond types per batch:", batch_size);
        info!("{: <25} {}", "samples per bond type:", options.nsample);
        info!("{:-^80}", "");
        info!("{: >10} {: >25} {: >25}", "step", "loss", "learning rate");
        info!("{:-^80}", "");

        let mut params: Array1<f64> = self.flat_params();
        let mut last_loss: f64 = f64::NAN;
        for istep in 0..options.nstep {
            let mut order: Vec<usize> = (0..n_bonds).collect();
            order.shuffle(&mut self.rng);
            {
                // field-wise borrows, the sampler needs the generator mutably
                let objective = BatchLoss {
                    model: FormulaModel {
                        formula: self.config.functype,
                        bond_r0: &self.bond_r0,
                        cutoffs: &self.cutoffs,
                        w: self.config.w,
                    },
                    reference: &self.reference,
                    shape,
                };
                let rng = &mut self.rng;
                for batch in order.chunks(batch_size) {
                    let (r_min, r_max): (Vec<f64>, Vec<f64>) =
                        batch.iter().map(|bond| ranges[*bond]).unzip();
                    let closure: &mut Objective = &mut |flat: ArrayView1<f64>| {
                        let distances: Array2<f64> =
                            truncated_normal(&mut *rng, &r_min, &r_max, options.nsample)?;
                        objective.loss_and_grad(flat, batch, distances.view())
                    };
                    last_loss = optimizer.step(&mut params, closure)?;
                }
            }
            self.set_flat_params(params.view())?;
            scheduler.advance(optimizer.as_mut());
            self.symmetrize();
            params = self.flat_params();

            if !last_loss.is_finite() {
                warn!("the loss is not finite in step {}: {}", istep, last_loss);
            }
            if options.dis_freq > 0 && istep % options.dis_freq == 0 {
                info!(
                    "{: >10} {:>25.12} {:>25.8e}",
                    istep,
                    last_loss,
                    scheduler.last_lr()
                );
            }
            if options.save_freq > 0 && istep % options.save_freq == 0 {
                if let Some(dir) = &options.checkpoint_dir {
                    self.save(dir)?;
                }
            }
        }
        info!("{:-^80}", "");
        info!("{: <25} {:.12}", "final loss:", last_loss);
        self.last_loss = Some(last_loss);
        info!("{}", timer);
        Ok(true)
    }

    /// Loss of the last batch of the most recent `optimize` call that ran at least one step.
    pub fn last_loss(&self) -> Option<f64> {
        self.last_loss
    }

    /// Hopping parameters followed by the overlap parameters.
    fn flat_params(&self) -> Array1<f64> {
        self.hopping_params
            .iter()
            .chain(self.overlap_params.iter())
            .copied()
            .collect()
    }

    fn set_flat_params(&mut self, flat: ArrayView1<f64>) -> Result<()> {
        let shape: (usize, usize, usize) = self.hopping_params.dim();
        let size: usize = shape.0 * shape.1 * shape.2;
        if flat.len() != 2 * size {
            return Err(FitError::shape("flat parameter vector", 2 * size, flat.len()));
        }
        let hopping: Array3<f64> = Array3::from_shape_vec(shape, flat.slice(s![..size]).to_vec())
            .map_err(|err| FitError::config(format!("hopping parameters: {}", err)))?;
        let overlap: Array3<f64> = Array3::from_shape_vec(shape, flat.slice(s![size..]).to_vec())
            .map_err(|err| FitError::config(format!("overlap parameters: {}", err)))?;
        self.hopping_params = hopping;
        self.overlap_params = overlap;
        Ok(())
    }

    /// Current loss and its gradient for the given distances, evaluated on the bond
    /// types in `bonds`.
    pub fn loss(&self, distances: ArrayView2<f64>, bonds: &[usize]) -> Result<(f64, Array1<f64>)> {
        self.check_bonds(distances, bonds)?;
        let objective = BatchLoss {
            model: self.model(),
            reference: &self.reference,
            shape: self.hopping_params.dim(),
        };
        objective.loss_and_grad(self.flat_params().view(), bonds, distances)
    }
}
