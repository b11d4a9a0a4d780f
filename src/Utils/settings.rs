//! Tolerances and solver parameters in one place, loadable from TOML:
//!
//! ```toml
//! [lu]
//! singularity_threshold = 1e-11
//! [qr]
//! threshold = 0.0
//! [cholesky]
//! relative_symmetry_threshold = 1e-15
//! absolute_positivity_threshold = 1e-10
//! rectangular_small = 0.0
//! [eigen]
//! epsilon = 1e-12
//! av_vd_check = 1e-6
//! [iterative]
//! max_iterations = 1000
//! delta = 1e-10
//! check = true
//! [logging]
//! level = "info"
//! file = "linalg.log"
//! ```
//!
//! Every key is optional; missing ones keep their defaults. Unknown sections
//! or keys are rejected.
use log::info;
use simplelog::LevelFilter;
use std::path::Path;
use toml::{Table, Value};

use crate::Utils::logger::{init_logger, parse_level};
use crate::decompositions::cholesky_decomposition::{
    CholeskyDecomposition, DEFAULT_ABSOLUTE_POSITIVITY_THRESHOLD, DEFAULT_RELATIVE_SYMMETRY_THRESHOLD,
};
use crate::decompositions::complex_eigen_decomposition::{
    ComplexEigenDecomposition, DEFAULT_EPSILON_AV_VD_CHECK,
};
use crate::decompositions::eigen_decomposition_non_symmetric::EigenDecompositionNonSymmetric;
use crate::decompositions::eigen_decomposition_symmetric::{
    DEFAULT_EPSILON, EigenDecompositionSymmetric,
};
use crate::decompositions::lu_decomposition::{DEFAULT_TOO_SMALL, LUDecomposition};
use crate::decompositions::qr_decomposition::QRDecomposition;
use crate::decompositions::rectangular_cholesky_decomposition::RectangularCholeskyDecomposition;
use crate::iterative_solvers::conjugate_gradient::ConjugateGradient;
use crate::iterative_solvers::symm_lq::SymmLQ;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::real_matrix::RealMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct LinAlgSettings {
    pub lu_singularity_threshold: f64,
    pub qr_threshold: f64,
    pub cholesky_relative_symmetry_threshold: f64,
    pub cholesky_absolute_positivity_threshold: f64,
    pub rectangular_cholesky_small: f64,
    pub eigen_epsilon: f64,
    pub eigen_av_vd_check: f64,
    pub max_iterations: usize,
    pub delta: f64,
    pub check: bool,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
}

impl Default for LinAlgSettings {
    fn default() -> Self {
        LinAlgSettings {
            lu_singularity_threshold: DEFAULT_TOO_SMALL,
            qr_threshold: 0.0,
            cholesky_relative_symmetry_threshold: DEFAULT_RELATIVE_SYMMETRY_THRESHOLD,
            cholesky_absolute_positivity_threshold: DEFAULT_ABSOLUTE_POSITIVITY_THRESHOLD,
            rectangular_cholesky_small: 0.0,
            eigen_epsilon: DEFAULT_EPSILON,
            eigen_av_vd_check: DEFAULT_EPSILON_AV_VD_CHECK,
            max_iterations: 1000,
            delta: 1e-10,
            check: true,
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

fn float(section: &str, key: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Integer(i) => Ok(*i as f64),
        _ => Err(LinAlgError::Settings(format!("{}.{} must be a number", section, key))),
    }
}

fn boolean(section: &str, key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| LinAlgError::Settings(format!("{}.{} must be true or false", section, key)))
}

fn string<'v>(section: &str, key: &str, value: &'v Value) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| LinAlgError::Settings(format!("{}.{} must be a string", section, key)))
}

fn unknown_key(section: &str, key: &str) -> LinAlgError {
    LinAlgError::Settings(format!("unknown key {}.{}", section, key))
}

impl LinAlgSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lu_singularity_threshold(mut self, threshold: f64) -> Self {
        self.lu_singularity_threshold = threshold;
        self
    }

    pub fn with_qr_threshold(mut self, threshold: f64) -> Self {
        self.qr_threshold = threshold;
        self
    }

    pub fn with_cholesky_thresholds(mut self, relative_symmetry: f64, absolute_positivity: f64) -> Self {
        self.cholesky_relative_symmetry_threshold = relative_symmetry;
        self.cholesky_absolute_positivity_threshold = absolute_positivity;
        self
    }

    pub fn with_rectangular_cholesky_small(mut self, small: f64) -> Self {
        self.rectangular_cholesky_small = small;
        self
    }

    pub fn with_eigen_tolerances(mut self, epsilon: f64, av_vd_check: f64) -> Self {
        self.eigen_epsilon = epsilon;
        self.eigen_av_vd_check = av_vd_check;
        self
    }

    pub fn with_iterative(mut self, max_iterations: usize, delta: f64, check: bool) -> Self {
        self.max_iterations = max_iterations;
        self.delta = delta;
        self.check = check;
        self
    }

    pub fn with_logging(mut self, level: LevelFilter, file: Option<&str>) -> Self {
        self.log_level = level;
        self.log_file = file.map(str::to_string);
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: Table = text
            .parse()
            .map_err(|e| LinAlgError::Settings(format!("invalid TOML: {}", e)))?;
        let mut settings = Self::default();
        for (section, content) in table.iter() {
            let entries = content
                .as_table()
                .ok_or_else(|| LinAlgError::Settings(format!("[{}] must be a table", section)))?;
            for (key, value) in entries.iter() {
                settings.apply(section, key, value)?;
            }
        }
        Ok(settings)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LinAlgError::Settings(format!("cannot read {}: {}", path.display(), e)))?;
        let settings = Self::from_toml_str(&text)?;
        info!("settings loaded from {}", path.display());
        Ok(settings)
    }

    fn apply(&mut self, section: &str, key: &str, value: &Value) -> Result<()> {
        match (section, key) {
            ("lu", "singularity_threshold") => self.lu_singularity_threshold = float(section, key, value)?,
            ("qr", "threshold") => self.qr_threshold = float(section, key, value)?,
            ("cholesky", "relative_symmetry_threshold") => {
                self.cholesky_relative_symmetry_threshold = float(section, key, value)?
            }
            ("cholesky", "absolute_positivity_threshold") => {
                self.cholesky_absolute_positivity_threshold = float(section, key, value)?
            }
            ("cholesky", "rectangular_small") => self.rectangular_cholesky_small = float(section, key, value)?,
            ("eigen", "epsilon") => self.eigen_epsilon = float(section, key, value)?,
            ("eigen", "av_vd_check") => self.eigen_av_vd_check = float(section, key, value)?,
            ("iterative", "max_iterations") => {
                let count = value
                    .as_integer()
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| LinAlgError::Settings("iterative.max_iterations must be a non-negative integer".to_string()))?;
                self.max_iterations = count as usize;
            }
            ("iterative", "delta") => self.delta = float(section, key, value)?,
            ("iterative", "check") => self.check = boolean(section, key, value)?,
            ("logging", "level") => self.log_level = parse_level(string(section, key, value)?)?,
            ("logging", "file") => self.log_file = Some(string(section, key, value)?.to_string()),
            _ => return Err(unknown_key(section, key)),
        }
        Ok(())
    }

    pub fn init_logging(&self) -> Result<()> {
        init_logger(self.log_level, self.log_file.as_deref())
    }

    pub fn conjugate_gradient(&self) -> ConjugateGradient {
        ConjugateGradient::new(self.max_iterations, self.delta, self.check)
    }

    pub fn symm_lq(&self) -> SymmLQ {
        SymmLQ::new(self.max_iterations, self.delta, self.check)
    }

    pub fn lu(&self, matrix: &dyn RealMatrix) -> Result<LUDecomposition> {
        LUDecomposition::with_threshold(matrix, self.lu_singularity_threshold)
    }

    pub fn qr(&self, matrix: &dyn RealMatrix) -> QRDecomposition {
        QRDecomposition::with_threshold(matrix, self.qr_threshold)
    }

    pub fn cholesky(&self, matrix: &dyn RealMatrix) -> Result<CholeskyDecomposition> {
        CholeskyDecomposition::with_thresholds(
            matrix,
            self.cholesky_relative_symmetry_threshold,
            self.cholesky_absolute_positivity_threshold,
        )
    }

    pub fn rectangular_cholesky(&self, matrix: &dyn RealMatrix) -> Result<RectangularCholeskyDecomposition> {
        RectangularCholeskyDecomposition::with_small(matrix, self.rectangular_cholesky_small)
    }

    pub fn eigen_symmetric(&self, matrix: &dyn RealMatrix) -> Result<EigenDecompositionSymmetric> {
        EigenDecompositionSymmetric::with_options(matrix, self.eigen_epsilon, true)
    }

    pub fn eigen_non_symmetric(&self, matrix: &dyn RealMatrix) -> Result<EigenDecompositionNonSymmetric> {
        EigenDecompositionNonSymmetric::with_epsilon(matrix, self.eigen_epsilon)
    }

    pub fn complex_eigen(&self, matrix: &dyn RealMatrix) -> Result<ComplexEigenDecomposition> {
        ComplexEigenDecomposition::with_tolerances(matrix, self.eigen_epsilon, self.eigen_av_vd_check)
    }
}
