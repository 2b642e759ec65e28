use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Severity of a review finding.
///
/// Order: Critical > High > Medium > Low > Info.
///
/// # Examples
///
/// ```
/// use crivo_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"HIGH\"").unwrap();
/// assert_eq!(s, Severity::High);
/// assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Must be fixed before merging.
    Critical,
    /// Important problem worth fixing in this PR.
    High,
    /// Improvement suggestion.
    Medium,
    /// Minor remark.
    Low,
    /// Informational note.
    Info,
}

impl Severity {
    /// Exact match on the uppercase label the model is asked to use.
    ///
    /// Unlike [`FromStr`], this does not fold case or trim, so `"low"` is
    /// not a label.
    ///
    /// # Examples
    ///
    /// ```
    /// use crivo_core::Severity;
    ///
    /// assert_eq!(Severity::from_label("LOW"), Some(Severity::Low));
    /// assert_eq!(Severity::from_label("low"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Severity> {
        match label {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "INFO" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Emoji used in the summary table and issue list.
    pub fn emoji(self) -> &'static str {
        match self {
            Severity::Critical => "\u{1f534}",
            Severity::High => "\u{1f7e0}",
            Severity::Medium => "\u{1f7e1}",
            Severity::Low => "\u{1f535}",
            Severity::Info => "\u{2139}\u{fe0f}",
        }
    }

    /// Label used at the top of inline comments, e.g. `🟠 IMPORTANTE`.
    pub fn comment_label(self) -> &'static str {
        match self {
            Severity::Critical => "\u{1f534} CRÍTICO",
            Severity::High => "\u{1f7e0} IMPORTANTE",
            Severity::Medium => "\u{1f7e1} SUGESTÃO",
            Severity::Low => "\u{1f535} MENOR",
            Severity::Info => "\u{2139}\u{fe0f} INFO",
        }
    }

    /// Returns `true` if `self` is at least as severe as `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crivo_core::Severity;
    ///
    /// assert!(Severity::Critical.meets_threshold(Severity::High));
    /// assert!(Severity::High.meets_threshold(Severity::High));
    /// assert!(!Severity::Medium.meets_threshold(Severity::High));
    /// ```
    pub fn meets_threshold(self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }

    fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// One finding reported by the review model.
///
/// Every field is optional because the model output is not trusted. Keys the
/// model adds beyond the known ones are kept in [`Issue::extra`] so the
/// output file echoes the issue as it was received.
///
/// # Examples
///
/// ```
/// use crivo_core::{Issue, Severity};
///
/// let issue: Issue = serde_json::from_str(
///     r#"{"path":"a.ts","line":"10","severity":"HIGH","title":"X"}"#,
/// ).unwrap();
/// assert_eq!(issue.line, Some(10));
/// assert_eq!(issue.severity_level(), Some(Severity::High));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// File path relative to the repository root.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,
    /// Line in the new version of the file.
    #[serde(
        default,
        deserialize_with = "lenient_line",
        skip_serializing_if = "Option::is_none"
    )]
    pub line: Option<u32>,
    /// Severity label exactly as the model wrote it.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity: Option<String>,
    /// Category such as `Security` or `Performance`.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    /// Short title.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    /// Detailed description with a suggested fix.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Unrecognised keys, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issue {
    /// Severity named by the label. A missing label means
    /// [`Severity::Info`]; a label outside the five known ones is `None`.
    pub fn severity_level(&self) -> Option<Severity> {
        match self.severity.as_deref() {
            None => Some(Severity::Info),
            Some(label) => Severity::from_label(label),
        }
    }
}

/// The model's structured review of a pull request.
///
/// # Examples
///
/// ```
/// use crivo_core::AnalysisResult;
///
/// let result: AnalysisResult = serde_json::from_str("{}").unwrap();
/// assert_eq!(result.summary, "Review concluído.");
/// assert_eq!(result.critical_count, 0);
/// assert!(result.issues.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Markdown overview written by the model.
    #[serde(default = "default_summary", deserialize_with = "summary_or_default")]
    pub summary: String,
    /// Number of critical issues, as reported by the model.
    #[serde(default, deserialize_with = "lenient_count")]
    pub critical_count: u32,
    /// Number of high issues, as reported by the model.
    #[serde(default, deserialize_with = "lenient_count")]
    pub high_count: u32,
    /// Number of medium issues, as reported by the model.
    #[serde(default, deserialize_with = "lenient_count")]
    pub medium_count: u32,
    /// Findings in the order the model listed them.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

fn default_summary() -> String {
    "Review concluído.".into()
}

impl AnalysisResult {
    /// A result with no issues, zero counters, and the given summary.
    pub fn empty(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            critical_count: 0,
            high_count: 0,
            medium_count: 0,
            issues: Vec::new(),
        }
    }

    /// Number of issues labelled exactly `severity`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crivo_core::{AnalysisResult, Severity};
    ///
    /// let result: AnalysisResult = serde_json::from_str(
    ///     r#"{"issues":[{"severity":"LOW"},{"severity":"HIGH"},{"severity":"LOW"}]}"#,
    /// ).unwrap();
    /// assert_eq!(result.count_severity(Severity::Low), 2);
    /// ```
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity_level() == Some(severity))
            .count()
    }

    /// Whether the model's counters agree with the severities in `issues`.
    pub fn counters_match_issues(&self) -> bool {
        self.critical_count as usize == self.count_severity(Severity::Critical)
            && self.high_count as usize == self.count_severity(Severity::High)
            && self.medium_count as usize == self.count_severity(Severity::Medium)
    }

    /// Replace the model's counters with counts derived from `issues`.
    pub fn recount(&mut self) {
        self.critical_count = self.count_severity(Severity::Critical) as u32;
        self.high_count = self.count_severity(Severity::High) as u32;
        self.medium_count = self.count_severity(Severity::Medium) as u32;
    }
}

/// A review comment anchored to a file line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineComment {
    /// File path relative to the repository root.
    pub path: String,
    /// Line in the new version of the file.
    pub line: u32,
    /// Markdown body.
    pub body: String,
}

/// The document written to `review-result.json`.
///
/// This is the contract consumed by the CI step that posts comments.
///
/// # Examples
///
/// ```
/// use crivo_core::ReviewOutput;
///
/// let output = ReviewOutput::no_changes("nothing to do");
/// let json = serde_json::to_value(&output).unwrap();
/// assert_eq!(json["critical_count"], 0);
/// assert!(json["comments"].as_array().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// Markdown summary for the PR conversation.
    pub summary: String,
    /// One inline comment per issue.
    pub comments: Vec<InlineComment>,
    /// Critical count carried over from the analysis.
    pub critical_count: u32,
    /// High count carried over from the analysis.
    pub high_count: u32,
    /// Issues carried over from the analysis.
    pub issues: Vec<Issue>,
}

impl ReviewOutput {
    /// Output for a PR without reviewable files.
    pub fn no_changes(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            comments: Vec::new(),
            critical_count: 0,
            high_count: 0,
            issues: Vec::new(),
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

fn summary_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_else(default_summary))
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_line<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_u32(&Value::deserialize(deserializer)?))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_u32(&Value::deserialize(deserializer)?).unwrap_or(0))
}
