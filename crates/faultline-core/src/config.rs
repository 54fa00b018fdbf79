use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FaultlineError;

/// Top-level configuration loaded from `.faultline.toml`.
///
/// Every field is defaulted, so an absent or empty file means default
/// behavior.
///
/// # Examples
///
/// ```
/// use faultline_core::FaultlineConfig;
///
/// let config = FaultlineConfig::default();
/// assert_eq!(config.policy.source_extensions, vec!["rs"]);
/// assert_eq!(config.mutation.template_version, 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultlineConfig {
    /// Which paths and lines are subject to policy.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Mutation engine settings.
    #[serde(default)]
    pub mutation: MutationConfig,
}

impl FaultlineConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultlineError::Io`] if the file cannot be read, or
    /// [`FaultlineError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use faultline_core::FaultlineConfig;
    /// use std::path::Path;
    ///
    /// let config = FaultlineConfig::from_file(Path::new(".faultline.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, FaultlineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`FaultlineError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use faultline_core::FaultlineConfig;
    ///
    /// let toml = r#"
    /// [policy]
    /// safety_lookback = 5
    /// "#;
    /// let config = FaultlineConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.policy.safety_lookback, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, FaultlineError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Policy eligibility and pattern-detection configuration.
///
/// Policy is about production code quality, so test and bench scaffolding
/// is excluded by path markers rather than content inspection.
///
/// # Examples
///
/// ```
/// use faultline_core::PolicyConfig;
///
/// let config = PolicyConfig::default();
/// assert!(config.test_path_segments.contains(&"tests".to_string()));
/// assert_eq!(config.safety_markers, vec!["SAFETY:"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Source-file extensions subject to policy (default: `["rs"]`).
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    /// Path segments marking test/bench trees (default: `tests`, `benches`,
    /// `test`, `testing`).
    #[serde(default = "default_test_path_segments")]
    pub test_path_segments: Vec<String>,
    /// File-name prefixes marking test files (default: `test_`).
    #[serde(default = "default_test_file_prefixes")]
    pub test_file_prefixes: Vec<String>,
    /// File-stem suffixes marking test files (default: `_test`, `_tests`).
    #[serde(default = "default_test_stem_suffixes")]
    pub test_stem_suffixes: Vec<String>,
    /// Additional glob patterns excluded from policy entirely.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Comment markers that justify an `unsafe` block (default: `SAFETY:`).
    #[serde(default = "default_safety_markers")]
    pub safety_markers: Vec<String>,
    /// How many preceding lines to scan for a safety marker (default: 3).
    #[serde(default = "default_safety_lookback")]
    pub safety_lookback: usize,
}

fn default_source_extensions() -> Vec<String> {
    vec!["rs".into()]
}

fn default_test_path_segments() -> Vec<String> {
    vec![
        "tests".into(),
        "benches".into(),
        "test".into(),
        "testing".into(),
    ]
}

fn default_test_file_prefixes() -> Vec<String> {
    vec!["test_".into()]
}

fn default_test_stem_suffixes() -> Vec<String> {
    vec!["_test".into(), "_tests".into()]
}

fn default_safety_markers() -> Vec<String> {
    vec!["SAFETY:".into()]
}

fn default_safety_lookback() -> usize {
    3
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            test_path_segments: default_test_path_segments(),
            test_file_prefixes: default_test_file_prefixes(),
            test_stem_suffixes: default_test_stem_suffixes(),
            skip_patterns: Vec::new(),
            safety_markers: default_safety_markers(),
            safety_lookback: default_safety_lookback(),
        }
    }
}

/// Mutation engine configuration.
///
/// # Examples
///
/// ```
/// use faultline_core::MutationConfig;
///
/// let config = MutationConfig::default();
/// assert_eq!(config.template_version, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Which adversarial template table to use (default: 1).
    ///
    /// Templates are versioned so a study can pin the exact replacement
    /// text its mutants were generated with.
    #[serde(default = "default_template_version")]
    pub template_version: u32,
}

fn default_template_version() -> u32 {
    1
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            template_version: default_template_version(),
        }
    }
}
