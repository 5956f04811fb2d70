use std::{
    fs,
    path::{Path, PathBuf},
    str::{FromStr, SplitWhitespace},
};

use serde::{Deserialize, Serialize};

use crate::{
    branching::{BranchingPolicy, MAX_ROOT_BRANCHING_FACTOR},
    error::ConfigError,
};

/// Tree shape parameters and the expected results of a run.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct TreeParams {
    pub root_branching_factor: f64,
    pub non_leaf_prob: f64,
    pub non_leaf_bf: u32,
    pub root_seed: u32,
    #[serde(default = "default_granularity")]
    pub compute_granularity: i64,
    pub expected_size: u64,
    pub expected_depth: u32,
    pub expected_leaves: u64,
}

const fn default_granularity() -> i64 {
    1
}

const FIELDS: [&str; 8] = [
    "root_branching_factor",
    "non_leaf_prob",
    "non_leaf_bf",
    "root_seed",
    "compute_granularity",
    "expected_size",
    "expected_depth",
    "expected_leaves",
];

struct Fields<'a> {
    path: &'a Path,
    tokens: SplitWhitespace<'a>,
    next_field: usize,
}

impl Fields<'_> {
    fn parse<T: FromStr>(&mut self) -> Result<T, ConfigError> {
        let field = FIELDS[self.next_field];
        self.next_field += 1;
        let token = self.tokens.next().ok_or_else(|| ConfigError::MissingField {
            path: self.path.to_path_buf(),
            field,
        })?;
        token.parse().map_err(|_| ConfigError::InvalidField {
            path: self.path.to_path_buf(),
            field,
            value: token.to_string(),
        })
    }
}

impl TreeParams {
    /// Reads a parameter file. `.yaml`/`.yml` files are parsed as YAML,
    /// anything else as eight whitespace-separated fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let params = if is_yaml {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::parse_fields(path, &contents)?
        };
        params.validated()
    }

    pub fn parse_fields(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let mut fields = Fields {
            path,
            tokens: contents.split_whitespace(),
            next_field: 0,
        };
        let params = Self {
            root_branching_factor: fields.parse()?,
            non_leaf_prob: fields.parse()?,
            non_leaf_bf: fields.parse()?,
            root_seed: fields.parse()?,
            compute_granularity: fields.parse()?,
            expected_size: fields.parse()?,
            expected_depth: fields.parse()?,
            expected_leaves: fields.parse()?,
        };
        if let Some(token) = fields.tokens.next() {
            return Err(ConfigError::TrailingToken {
                path: path.to_path_buf(),
                token: token.to_string(),
            });
        }
        Ok(params)
    }

    /// Checks the ranges the branching model relies on and raises the
    /// compute granularity to at least one.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if !self.root_branching_factor.is_finite() || self.root_branching_factor < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "root_branching_factor",
                reason: "must be a finite non-negative number",
            });
        }
        if self.root_branching_factor > MAX_ROOT_BRANCHING_FACTOR {
            return Err(ConfigError::OutOfRange {
                field: "root_branching_factor",
                reason: "must not exceed 4294967295",
            });
        }
        if !(0.0..=1.0).contains(&self.non_leaf_prob) {
            return Err(ConfigError::OutOfRange {
                field: "non_leaf_prob",
                reason: "must lie in [0, 1]",
            });
        }
        self.compute_granularity = self.compute_granularity.max(1);
        Ok(self)
    }

    #[must_use]
    pub const fn policy(&self) -> BranchingPolicy {
        BranchingPolicy::new(self.root_branching_factor, self.non_leaf_prob, self.non_leaf_bf)
    }

    #[must_use]
    pub fn granularity(&self) -> u32 {
        u32::try_from(self.compute_granularity.max(1)).unwrap_or(u32::MAX)
    }
}

/// How a run is executed and reported.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub input: PathBuf,
    pub workers: usize,
    pub serial: bool,
    pub runs: usize,
    pub stack_size_mb: usize,
    pub progress_ms: Option<u64>,
    pub csv: Option<PathBuf>,
    pub yaml: bool,
    pub strict: bool,
    pub track_alloc: bool,
}

impl RunSettings {
    #[must_use]
    pub const fn stack_size_bytes(&self) -> usize {
        self.stack_size_mb.saturating_mul(1024 * 1024)
    }
}
