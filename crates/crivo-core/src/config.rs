use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CrivoError;

/// Top-level configuration loaded from `.crivo.toml`.
///
/// Resolution order: CLI flags > config file > defaults. Every key is
/// optional, so an empty file reproduces the built-in behaviour.
///
/// # Examples
///
/// ```
/// use crivo_core::CrivoConfig;
///
/// let config = CrivoConfig::default();
/// assert_eq!(config.review.max_diff_chars, 50_000);
/// assert_eq!(config.artifacts.output, "review-result.json");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrivoConfig {
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Prompt and formatting limits.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Input and output file names.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

impl CrivoConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CrivoError::Io`] if the file cannot be read, or
    /// [`CrivoError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crivo_core::CrivoConfig;
    /// use std::path::Path;
    ///
    /// let config = CrivoConfig::from_file(Path::new(".crivo.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CrivoError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CrivoError::Toml`] if parsing fails, or
    /// [`CrivoError::Config`] if a limit is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use crivo_core::CrivoConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// max_prompt_files = 5
    /// "#;
    /// let config = CrivoConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.max_prompt_files, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CrivoError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CrivoError> {
        if self.llm.max_tokens == 0 {
            return Err(CrivoError::Config("llm.max_tokens must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(CrivoError::Config(format!(
                "llm.temperature must be between 0.0 and 1.0, got {}",
                self.llm.temperature
            )));
        }
        if let Some(ext) = self.review.extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(CrivoError::Config(format!(
                "review.extensions entries must start with '.', got {ext:?}"
            )));
        }
        Ok(())
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use crivo_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "claude-sonnet-4-20250514");
/// assert_eq!(config.max_tokens, 8000);
/// assert_eq!(config.temperature, 0.2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; takes precedence over the environment variable.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Base URL of the Messages API (default: `https://api.anthropic.com`).
    pub base_url: Option<String>,
    /// Maximum output tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// HTTP timeout for the single review request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".into()
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_temperature() -> f64 {
    0.2
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the config or the configured environment
    /// variable. Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`CrivoError::MissingCredential`] naming the variable.
    pub fn resolve_api_key(&self) -> Result<String, CrivoError> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(present))
            .ok_or_else(|| CrivoError::MissingCredential(self.api_key_env.clone()))
    }
}

/// Prompt and formatting limits.
///
/// # Examples
///
/// ```
/// use crivo_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.max_prompt_files, 20);
/// assert_eq!(config.max_typecheck_chars, 5000);
/// assert_eq!(config.max_lint_chars, 3000);
/// assert_eq!(config.summary_issue_limit, 10);
/// assert!(!config.recount_severities);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// File extensions eligible for review, with a leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Changed files listed in the prompt (default: 20).
    #[serde(default = "default_max_prompt_files")]
    pub max_prompt_files: usize,
    /// Diff characters embedded in the prompt (default: 50000).
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,
    /// Type-checker output characters embedded in the prompt (default: 5000).
    #[serde(default = "default_max_typecheck_chars")]
    pub max_typecheck_chars: usize,
    /// Pretty-printed lint report characters embedded in the prompt (default: 3000).
    #[serde(default = "default_max_lint_chars")]
    pub max_lint_chars: usize,
    /// Issues listed in the markdown summary (default: 10).
    #[serde(default = "default_summary_issue_limit")]
    pub summary_issue_limit: usize,
    /// Recompute severity counters from the issue list instead of trusting
    /// the model's own counters (default: false).
    #[serde(default)]
    pub recount_severities: bool,
    /// Description of the reviewed project placed at the top of the prompt.
    #[serde(default = "default_project_context")]
    pub project_context: String,
}

fn default_extensions() -> Vec<String> {
    [".ts", ".tsx", ".js", ".jsx", ".py", ".sql"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_prompt_files() -> usize {
    20
}

fn default_max_diff_chars() -> usize {
    50_000
}

fn default_max_typecheck_chars() -> usize {
    5000
}

fn default_max_lint_chars() -> usize {
    3000
}

fn default_summary_issue_limit() -> usize {
    10
}

fn default_project_context() -> String {
    "\
- Backend: Fastify + TypeScript + Drizzle ORM
- Frontend: React 19 + Vite + TailwindCSS
- Database: PostgreSQL (Supabase)
- Queue: Redis + BullMQ"
        .into()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_prompt_files: default_max_prompt_files(),
            max_diff_chars: default_max_diff_chars(),
            max_typecheck_chars: default_max_typecheck_chars(),
            max_lint_chars: default_max_lint_chars(),
            summary_issue_limit: default_summary_issue_limit(),
            recount_severities: false,
            project_context: default_project_context(),
        }
    }
}

/// File names of the CI artifacts, relative to the working directory.
///
/// # Examples
///
/// ```
/// use crivo_core::ArtifactConfig;
///
/// let config = ArtifactConfig::default();
/// assert_eq!(config.changed_files, "changed-files.txt");
/// assert_eq!(config.lint, "eslint-output.json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Newline-separated list of changed paths.
    #[serde(default = "default_changed_files")]
    pub changed_files: String,
    /// Unified diff of the PR.
    #[serde(default = "default_diff")]
    pub diff: String,
    /// Type-checker log.
    #[serde(default = "default_typecheck")]
    pub typecheck: String,
    /// Linter JSON report.
    #[serde(default = "default_lint")]
    pub lint: String,
    /// Review result written by the run.
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_changed_files() -> String {
    "changed-files.txt".into()
}

fn default_diff() -> String {
    "pr-diff.txt".into()
}

fn default_typecheck() -> String {
    "typecheck-output.txt".into()
}

fn default_lint() -> String {
    "eslint-output.json".into()
}

fn default_output() -> String {
    "review-result.json".into()
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            changed_files: default_changed_files(),
            diff: default_diff(),
            typecheck: default_typecheck(),
            lint: default_lint(),
            output: default_output(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CrivoConfig::default();
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.max_tokens, 8000);
        assert_eq!(config.llm.timeout_secs, 600);
        assert!(config.llm.base_url.is_none());
        assert_eq!(
            config.review.extensions,
            vec![".ts", ".tsx", ".js", ".jsx", ".py", ".sql"]
        );
        assert_eq!(config.review.max_diff_chars, 50_000);
        assert!(config.review.project_context.contains("Fastify"));
        assert_eq!(config.artifacts.diff, "pr-diff.txt");
        assert_eq!(config.artifacts.typecheck, "typecheck-output.txt");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CrivoConfig::from_toml("").unwrap();
        assert_eq!(config.review.max_prompt_files, 20);
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.artifacts.output, "review-result.json");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[llm]
model = "claude-opus-4-20250514"
base_url = "http://localhost:8080"
api_key_env = "REVIEW_KEY"
max_tokens = 4000
temperature = 0.0
timeout_secs = 30

[review]
extensions = [".rs", ".go"]
max_diff_chars = 1000
recount_severities = true
project_context = "- Backend: Rust + axum"

[artifacts]
diff = "out/diff.patch"
output = "out/result.json"
"#;
        let config = CrivoConfig::from_toml(toml).unwrap();
        assert_eq!(config.llm.model, "claude-opus-4-20250514");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.llm.api_key_env, "REVIEW_KEY");
        assert_eq!(config.llm.max_tokens, 4000);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.review.extensions, vec![".rs", ".go"]);
        assert_eq!(config.review.max_diff_chars, 1000);
        assert_eq!(config.review.max_lint_chars, 3000);
        assert!(config.review.recount_severities);
        assert_eq!(config.artifacts.diff, "out/diff.patch");
        assert_eq!(config.artifacts.changed_files, "changed-files.txt");
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(CrivoConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = CrivoConfig::from_toml("[llm]\ntemperature = 3.5\n").unwrap_err();
        assert!(err.to_string().contains("temperature"));

        let err = CrivoConfig::from_toml("[llm]\nmax_tokens = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_tokens"));

        let err = CrivoConfig::from_toml("[review]\nextensions = [\"ts\"]\n").unwrap_err();
        assert!(err.to_string().contains("extensions"));
    }

    #[test]
    fn api_key_from_config_wins() {
        let config = LlmConfig {
            api_key: Some("sk-config".into()),
            api_key_env: "CRIVO_TEST_UNSET_VARIABLE".into(),
            ..LlmConfig::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "sk-config");
    }

    #[test]
    fn missing_api_key_names_variable() {
        let config = LlmConfig {
            api_key: Some("   ".into()),
            api_key_env: "CRIVO_TEST_UNSET_VARIABLE".into(),
            ..LlmConfig::default()
        };
        let err = config.resolve_api_key().unwrap_err();
        assert!(matches!(err, CrivoError::MissingCredential(ref v) if v == "CRIVO_TEST_UNSET_VARIABLE"));
    }
}
