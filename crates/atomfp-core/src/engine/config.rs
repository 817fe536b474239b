use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Screening method used when features outnumber samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ScreeningMethod {
    /// Rank-correlation screening (`rrcs`), robust to monotone nonlinearity.
    #[serde(rename = "rrcs")]
    RankCorrelation,
    /// Sure independence screening (`sis`) on plain linear correlation.
    #[serde(rename = "sis")]
    SureIndependence,
}

/// Correlation statistic used by the rank-correlation screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationKind {
    Pearson,
    Spearman,
    Kendall,
}

/// Kernel family of the surrogate predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Gaussian,
}

/// Whether the reducer searches for the best subset size or truncates to a
/// caller-fixed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTarget {
    /// Sweep every candidate size and keep the validation-error argmin.
    Optimize,
    /// Truncate to exactly this many features.
    Fixed(usize),
}

/// Exponents for the powered-product and log-combination expansion families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpansionParams {
    pub power_a: i32,
    pub power_b: i32,
}

impl Default for ExpansionParams {
    fn default() -> Self {
        Self {
            power_a: 2,
            power_b: 4,
        }
    }
}

/// Parameters of the lasso regularization-path sweep.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LassoParams {
    /// Number of regularization strengths visited, smallest first.
    pub steps: usize,
    /// Bound on coordinate-descent sweeps per strength.
    pub max_iter: usize,
    /// Smallest regularization strength of the sweep.
    pub initial_alpha: f64,
}

impl Default for LassoParams {
    fn default() -> Self {
        Self {
            steps: 20,
            max_iter: 1_000_000,
            initial_alpha: 0.1,
        }
    }
}

/// Immutable configuration of a model-building run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelBuilderConfig {
    /// Single-pass screening method when features outnumber samples.
    pub screening_method: ScreeningMethod,
    /// Correlation statistic for the rank-correlation screens.
    pub screening_correlation: CorrelationKind,
    /// Run one unreduced prediction pass for reference logging.
    pub initial_prediction: bool,
    /// Remove zero-variance training columns before anything else.
    pub clean: bool,
    /// Combinatorially expand the feature set before reduction.
    pub expand: bool,
    /// Exponents for the powered expansion families.
    pub expansion: ExpansionParams,
    /// Optimal-size search versus fixed truncation.
    pub selection: SizeTarget,
    /// Kernel family of the surrogate predictor.
    pub kernel: KernelKind,
    /// Starting kernel bandwidth, broadcast across features.
    pub width: f64,
    /// Starting noise level added to the kernel diagonal.
    pub regularization: f64,
    /// Re-tune (bandwidths, noise) on the finalized reduced matrix.
    pub tune: bool,
    /// Lasso path sweep parameters.
    pub lasso: LassoParams,
    /// Write the training partition to the descriptor store when one is attached.
    pub persist_train: bool,
    /// Write the test partition to the descriptor store when one is attached.
    pub persist_test: bool,
}

impl Default for ModelBuilderConfig {
    fn default() -> Self {
        Self {
            screening_method: ScreeningMethod::RankCorrelation,
            screening_correlation: CorrelationKind::Kendall,
            initial_prediction: true,
            clean: true,
            expand: true,
            expansion: ExpansionParams::default(),
            selection: SizeTarget::Optimize,
            kernel: KernelKind::Gaussian,
            width: 0.5,
            regularization: 0.001,
            tune: true,
            lasso: LassoParams::default(),
            persist_train: true,
            persist_test: true,
        }
    }
}

impl ModelBuilderConfig {
    pub fn builder() -> ModelBuilderConfigBuilder {
        ModelBuilderConfigBuilder::default()
    }

    /// Parses a configuration from a TOML document; unspecified keys take
    /// their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "width",
                reason: format!("must be positive, got {}", self.width),
            });
        }
        if !(self.regularization > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "regularization",
                reason: format!("must be positive, got {}", self.regularization),
            });
        }
        if let SizeTarget::Fixed(0) = self.selection {
            return Err(ConfigError::InvalidParameter {
                name: "selection",
                reason: "fixed size must be at least 1".to_string(),
            });
        }
        if self.lasso.steps < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "lasso.steps",
                reason: format!("need at least 2 path steps, got {}", self.lasso.steps),
            });
        }
        if !(self.lasso.initial_alpha > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "lasso.initial_alpha",
                reason: format!("must be positive, got {}", self.lasso.initial_alpha),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ModelBuilderConfigBuilder {
    config: ModelBuilderConfig,
}

impl ModelBuilderConfigBuilder {
    pub fn screening_method(mut self, method: ScreeningMethod) -> Self {
        self.config.screening_method = method;
        self
    }
    pub fn screening_correlation(mut self, corr: CorrelationKind) -> Self {
        self.config.screening_correlation = corr;
        self
    }
    pub fn initial_prediction(mut self, enabled: bool) -> Self {
        self.config.initial_prediction = enabled;
        self
    }
    pub fn clean(mut self, enabled: bool) -> Self {
        self.config.clean = enabled;
        self
    }
    pub fn expand(mut self, enabled: bool) -> Self {
        self.config.expand = enabled;
        self
    }
    pub fn expansion(mut self, params: ExpansionParams) -> Self {
        self.config.expansion = params;
        self
    }
    pub fn selection(mut self, selection: SizeTarget) -> Self {
        self.config.selection = selection;
        self
    }
    pub fn width(mut self, width: f64) -> Self {
        self.config.width = width;
        self
    }
    pub fn regularization(mut self, regularization: f64) -> Self {
        self.config.regularization = regularization;
        self
    }
    pub fn tune(mut self, enabled: bool) -> Self {
        self.config.tune = enabled;
        self
    }
    pub fn lasso(mut self, params: LassoParams) -> Self {
        self.config.lasso = params;
        self
    }
    pub fn persist_train(mut self, enabled: bool) -> Self {
        self.config.persist_train = enabled;
        self
    }
    pub fn persist_test(mut self, enabled: bool) -> Self {
        self.config.persist_test = enabled;
        self
    }

    pub fn build(self) -> Result<ModelBuilderConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
