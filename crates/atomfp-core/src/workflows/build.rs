use crate::core::features;
use crate::core::graph::GraphError;
use crate::core::models::structure::Structure;
use crate::engine::config::{ModelBuilderConfig, ScreeningMethod, SizeTarget};
use crate::engine::error::ModelError;
use crate::engine::predictor::{self, PredictionOutcome};
use crate::engine::projection;
use crate::engine::regression;
use crate::engine::screening::{self, ScreenPartition};
use crate::engine::stages::{clean, expand, standardize};
use crate::engine::state::SelectionState;
use crate::engine::store::{DescriptorStore, Partition};
use crate::engine::tuner;
use nalgebra::{DMatrix, DVector};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const ORIGINAL_TABLE: &str = "OriginalFeatureSpace";
const EXPANDED_TABLE: &str = "ExpandedFeatureSpace";

/// One candidate subset size and its held-out error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeTrial {
    pub size: usize,
    pub validation_rmse: f64,
}

/// The best projection found while sweeping PCA components for one subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcaTrial {
    pub components: usize,
    pub size: usize,
    pub validation_rmse: f64,
}

/// Everything the reduction measured along the way, for inspection and
/// comparison against the finalized model.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionReport {
    /// Training columns dropped by the zero-variance clean.
    pub dropped_zero_variance: Vec<usize>,
    /// Columns rejected by screening (zero when screening did not run).
    pub screened_out: usize,
    /// The unreduced reference prediction, when configured.
    pub baseline: Option<PredictionOutcome>,
    /// Held-out RMSE of the ridge-ranking linear model.
    pub linear_rmse: f64,
    /// Feature ordering by descending ridge coefficient magnitude.
    pub ridge_order: Vec<usize>,
    /// Minimum held-out RMSE along the lasso path.
    pub lasso_min_rmse: f64,
    /// Active-set size at the lasso-path minimum.
    pub lasso_min_features: usize,
    /// Every evaluated subset size, ascending.
    pub size_trials: Vec<SizeTrial>,
    /// The finalized subset size.
    pub best_size: usize,
    /// Held-out RMSE at the finalized size.
    pub best_rmse: f64,
    /// Best-effort PCA comparison; never feeds the selection decision.
    pub best_projection: Option<PcaTrial>,
}

impl ReductionReport {
    fn empty() -> Self {
        Self {
            dropped_zero_variance: Vec::new(),
            screened_out: 0,
            baseline: None,
            linear_rmse: f64::INFINITY,
            ridge_order: Vec::new(),
            lasso_min_rmse: f64::INFINITY,
            lasso_min_features: 0,
            size_trials: Vec::new(),
            best_size: 0,
            best_rmse: f64::INFINITY,
            best_projection: None,
        }
    }
}

/// The finalized model: a reduced, named feature matrix pair plus the kernel
/// hyperparameters to predict with.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedModel {
    pub feature_names: Vec<String>,
    pub train: DMatrix<f64>,
    pub test: DMatrix<f64>,
    pub widths: Vec<f64>,
    pub noise: f64,
    pub report: ReductionReport,
}

/// Drives the complete model-building pipeline.
///
/// A builder owns its configuration plus the current kernel hyperparameters;
/// finalizing a model updates the hyperparameters in place so subsequent
/// predictions use the tuned values.
pub struct ModelBuilder {
    config: ModelBuilderConfig,
    widths: Vec<f64>,
    noise: f64,
    store: Option<DescriptorStore>,
}

impl ModelBuilder {
    pub fn new(config: ModelBuilderConfig) -> Self {
        let widths = vec![config.width];
        let noise = config.regularization;
        Self {
            config,
            widths,
            noise,
            store: None,
        }
    }

    /// Attaches a descriptor store; train/test matrices are recorded there
    /// according to the persistence flags in the configuration.
    pub fn with_store(mut self, store: DescriptorStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &ModelBuilderConfig {
        &self.config
    }

    /// Current kernel bandwidths (a single value broadcasts over features).
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Current kernel noise level.
    pub fn noise(&self) -> f64 {
        self.noise
    }

    /// Builds a model from structures, generating fingerprints with the
    /// supplied function.
    #[instrument(skip_all, name = "model_from_structures")]
    pub fn from_structures<F>(
        &mut self,
        train_structures: &[Structure],
        mut fingerprint_fn: F,
        train_target: &[f64],
        test_structures: &[Structure],
        test_target: &[f64],
        feature_names: Option<Vec<String>>,
    ) -> Result<ReducedModel, ModelError>
    where
        F: FnMut(&Structure) -> Result<Vec<f64>, GraphError>,
    {
        let train = features::assemble(train_structures, &mut fingerprint_fn)?;
        let test = features::assemble(test_structures, &mut fingerprint_fn)?;

        self.from_matrix(
            train.matrix,
            Some(train.ids),
            train_target,
            test.matrix,
            Some(test.ids),
            test_target,
            feature_names,
        )
    }

    /// Builds a model from precomputed train/test feature matrices.
    ///
    /// Identifiers default to positional labels and feature names to
    /// `f0..fN-1` when not supplied. Row counts of matrices, identifiers,
    /// and targets are validated before any work happens.
    #[instrument(skip_all, name = "model_from_matrix")]
    pub fn from_matrix(
        &mut self,
        train_matrix: DMatrix<f64>,
        train_ids: Option<Vec<String>>,
        train_target: &[f64],
        test_matrix: DMatrix<f64>,
        test_ids: Option<Vec<String>>,
        test_target: &[f64],
        feature_names: Option<Vec<String>>,
    ) -> Result<ReducedModel, ModelError> {
        if train_matrix.nrows() == 0 {
            return Err(ModelError::ShapeMismatch {
                what: "training samples",
                expected: 1,
                found: 0,
            });
        }
        check_rows("training targets", train_matrix.nrows(), train_target.len())?;
        check_rows("test targets", test_matrix.nrows(), test_target.len())?;

        let train_ids = resolve_ids(train_ids, Partition::Train, train_matrix.nrows())?;
        let test_ids = resolve_ids(test_ids, Partition::Test, test_matrix.nrows())?;

        let names = feature_names
            .unwrap_or_else(|| (0..train_matrix.ncols()).map(|i| format!("f{i}")).collect());
        let state = SelectionState::new(train_matrix, test_matrix, names)?;

        let train_target = DVector::from_column_slice(train_target);
        let test_target = DVector::from_column_slice(test_target);

        self.build(state, &train_ids, &train_target, &test_ids, &test_target)
    }

    #[instrument(skip_all, name = "model_build")]
    fn build(
        &mut self,
        state: SelectionState,
        train_ids: &[String],
        train_target: &DVector<f64>,
        test_ids: &[String],
        test_target: &DVector<f64>,
    ) -> Result<ReducedModel, ModelError> {
        let mut report = ReductionReport::empty();
        info!(
            samples = state.sample_count(),
            features = state.feature_count(),
            "starting model build"
        );

        self.persist(Partition::Train, self.config.persist_train, ORIGINAL_TABLE, train_ids, &state.train, train_target, &state.names);
        self.persist(Partition::Test, self.config.persist_test, ORIGINAL_TABLE, test_ids, &state.test, test_target, &state.names);

        // Clean, then standardize on training statistics.
        let state = if self.config.clean {
            let (cleaned, dropped) = clean::clean(state);
            if !dropped.is_empty() {
                info!(dropped = dropped.len(), "removed zero-variance features");
            }
            report.dropped_zero_variance = dropped;
            cleaned
        } else {
            state
        };
        let (mut state, _standardizer) = standardize::standardize(state);

        // A fixed target size must be satisfiable before any fitting starts.
        if let SizeTarget::Fixed(size) = self.config.selection {
            if state.feature_count() <= size {
                return Err(ModelError::SizeExceedsFeatures {
                    requested: size,
                    available: state.feature_count(),
                });
            }
        }

        if self.config.initial_prediction {
            let baseline = predictor::predict(
                &state.train,
                &state.test,
                train_target,
                test_target,
                self.config.kernel,
                &self.widths,
                self.noise,
            )?;
            info!(
                validation_rmse = baseline.validation_rmse,
                "initial unreduced model"
            );
            report.baseline = Some(baseline);
        }

        if self.config.expand {
            state = expand::expand(state, &self.config.expansion);
            info!(features = state.feature_count(), "expanded feature space");
            self.persist(Partition::Train, self.config.persist_train, EXPANDED_TABLE, train_ids, &state.train, train_target, &state.names);
            self.persist(Partition::Test, self.config.persist_test, EXPANDED_TABLE, test_ids, &state.test, test_target, &state.names);
        }

        let state = self.reduce(state, train_target, test_target, &mut report)?;

        if self.config.tune && state.feature_count() > 0 {
            let tuned = tuner::tune(&state.train, train_target, &self.widths, self.noise)?;
            info!(noise = tuned.noise, "tuned kernel hyperparameters");
            self.widths = tuned.widths;
            self.noise = tuned.noise;
        }

        info!(
            best_size = report.best_size,
            best_rmse = report.best_rmse,
            "model build finished"
        );
        Ok(ReducedModel {
            feature_names: state.names.clone(),
            train: state.train.clone(),
            test: state.test.clone(),
            widths: self.widths.clone(),
            noise: self.noise,
            report,
        })
    }

    /// The reduction search: screen if oversized, rank, path-select, then
    /// either sweep candidate sizes or truncate to the configured one.
    fn reduce(
        &self,
        mut state: SelectionState,
        train_target: &DVector<f64>,
        test_target: &DVector<f64>,
        report: &mut ReductionReport,
    ) -> Result<SelectionState, ModelError> {
        let n = state.sample_count();
        let d = state.feature_count();
        if d == 0 {
            warn!("no features survived cleaning; returning an empty model");
            return Ok(state);
        }

        if d > n {
            let partition = self.screen(&state.train, train_target, n, d);
            report.screened_out = partition.rejected.len();
            info!(
                accepted = partition.accepted.len(),
                rejected = partition.rejected.len(),
                "screened oversized feature space"
            );
            state = state.drop_columns(&partition.rejected);
        }

        let ridge = regression::ridge_rank(&state.train, train_target, &state.test, test_target)?;
        info!(linear_rmse = ridge.validation_rmse, "ridge ranking complete");
        report.linear_rmse = ridge.validation_rmse;
        report.ridge_order = ridge.order;

        let path = regression::lasso_path(
            &state.train,
            train_target,
            &state.test,
            test_target,
            self.config.lasso.steps,
            self.config.lasso.max_iter,
            self.config.lasso.initial_alpha,
        )?;
        info!(
            lasso_min_rmse = path.min_error,
            lasso_min_features = path.min_features,
            "lasso path complete"
        );
        report.lasso_min_rmse = path.min_error;
        report.lasso_min_features = path.min_features;

        let best_size = match self.config.selection {
            SizeTarget::Optimize => {
                let (trials, best_size, best_rmse, best_projection) =
                    self.size_search(&state, &path.order, train_target, test_target)?;
                report.size_trials = trials;
                report.best_rmse = best_rmse;
                report.best_projection = best_projection;
                best_size
            }
            SizeTarget::Fixed(size) => {
                // Screening may have cut below the post-clean count checked
                // at ingest; the fixed size must still be available.
                if size > path.order.len() {
                    return Err(ModelError::SizeExceedsFeatures {
                        requested: size,
                        available: path.order.len(),
                    });
                }
                size
            }
        };
        report.best_size = best_size;

        let mut finalized = state.keep_columns(&path.order[..best_size]);
        if let SizeTarget::Fixed(_) = self.config.selection {
            let outcome = predictor::predict(
                &finalized.train,
                &finalized.test,
                train_target,
                test_target,
                self.config.kernel,
                &self.widths,
                self.noise,
            )?;
            report.best_rmse = outcome.validation_rmse;
        }
        finalized = finalized.with_best(report.best_rmse, best_size);
        Ok(finalized)
    }

    fn screen(
        &self,
        train: &DMatrix<f64>,
        target: &DVector<f64>,
        n: usize,
        d: usize,
    ) -> ScreenPartition {
        if d > 2 * n {
            let step = ((d as f64 / n as f64).ln().sqrt().round() as usize).max(1);
            screening::iterative(
                train,
                target,
                n,
                step,
                self.config.screening_method,
                self.config.screening_correlation,
            )
        } else {
            match self.config.screening_method {
                ScreeningMethod::RankCorrelation => screening::rank_correlation(
                    train,
                    target,
                    n,
                    self.config.screening_correlation,
                ),
                ScreeningMethod::SureIndependence => {
                    screening::sure_independence(train, target, n)
                }
            }
        }
    }

    /// Evaluates every candidate subset size and, for sizes above one, a
    /// best-effort PCA comparison. Candidates are independent; under the
    /// `parallel` feature they are scored concurrently and the only
    /// synchronization is the minimum reduction below.
    fn size_search(
        &self,
        state: &SelectionState,
        order: &[usize],
        train_target: &DVector<f64>,
        test_target: &DVector<f64>,
    ) -> Result<(Vec<SizeTrial>, usize, f64, Option<PcaTrial>), ModelError> {
        let limit = state.sample_count().min(state.feature_count());
        let sizes: Vec<usize> = (1..=limit).collect();

        let evaluate = |s: usize| -> Result<(SizeTrial, Option<PcaTrial>), ModelError> {
            let subset = state.keep_columns(&order[..s]);
            let outcome = predictor::predict(
                &subset.train,
                &subset.test,
                train_target,
                test_target,
                self.config.kernel,
                &self.widths,
                self.noise,
            )?;
            let projection = if s > 1 {
                self.pca_sweep(&subset, s, train_target, test_target)?
            } else {
                None
            };
            Ok((
                SizeTrial {
                    size: s,
                    validation_rmse: outcome.validation_rmse,
                },
                projection,
            ))
        };

        #[cfg(feature = "parallel")]
        let evaluated: Result<Vec<_>, ModelError> =
            sizes.par_iter().map(|&s| evaluate(s)).collect();
        #[cfg(not(feature = "parallel"))]
        let evaluated: Result<Vec<_>, ModelError> = sizes.iter().map(|&s| evaluate(s)).collect();
        let evaluated = evaluated?;

        let mut trials = Vec::with_capacity(evaluated.len());
        let mut best: Option<SizeTrial> = None;
        let mut best_projection: Option<PcaTrial> = None;
        for (trial, projection) in evaluated {
            // Strict comparison in ascending size order: ties go to the
            // smallest subset.
            if best.is_none_or(|b| trial.validation_rmse < b.validation_rmse) {
                best = Some(trial);
            }
            if let Some(p) = projection {
                if best_projection.is_none_or(|b| p.validation_rmse < b.validation_rmse) {
                    best_projection = Some(p);
                }
            }
            trials.push(trial);
        }

        let best = best.unwrap_or(SizeTrial {
            size: 0,
            validation_rmse: f64::INFINITY,
        });
        Ok((trials, best.size, best.validation_rmse, best_projection))
    }

    fn pca_sweep(
        &self,
        subset: &SelectionState,
        size: usize,
        train_target: &DVector<f64>,
        test_target: &DVector<f64>,
    ) -> Result<Option<PcaTrial>, ModelError> {
        let mut best: Option<PcaTrial> = None;
        for components in 1..size {
            let projected = projection::pca(&subset.train, &subset.test, components)?;
            let outcome = predictor::predict(
                &projected.train,
                &projected.test,
                train_target,
                test_target,
                self.config.kernel,
                &self.widths,
                self.noise,
            )?;
            if best.is_none_or(|b| outcome.validation_rmse < b.validation_rmse) {
                best = Some(PcaTrial {
                    components,
                    size,
                    validation_rmse: outcome.validation_rmse,
                });
            }
        }
        Ok(best)
    }

    fn persist(
        &self,
        partition: Partition,
        enabled: bool,
        table: &str,
        ids: &[String],
        matrix: &DMatrix<f64>,
        targets: &DVector<f64>,
        names: &[String],
    ) {
        let Some(store) = &self.store else {
            return;
        };
        if !enabled {
            return;
        }
        if let Err(e) = store.write_table(partition, table, ids, matrix, targets.as_slice(), names)
        {
            // The store is a record, not the source of truth; the in-memory
            // pipeline continues regardless.
            warn!(
                error = %e,
                table,
                partition = partition.as_str(),
                "descriptor store write failed"
            );
        }
    }
}

fn check_rows(what: &'static str, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected != found {
        return Err(ModelError::ShapeMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

fn resolve_ids(
    ids: Option<Vec<String>>,
    partition: Partition,
    rows: usize,
) -> Result<Vec<String>, ModelError> {
    match ids {
        Some(ids) => {
            check_rows("identifiers", rows, ids.len())?;
            Ok(ids)
        }
        None => Ok((0..rows)
            .map(|i| format!("{}-{i}", partition.as_str()))
            .collect()),
    }
}
