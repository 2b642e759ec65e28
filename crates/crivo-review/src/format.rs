use std::fmt::Write;

use crivo_core::{AnalysisResult, InlineComment, Severity};

/// Marker for a severity label outside the known set.
const UNKNOWN_SEVERITY: &str = "\u{2139}\u{fe0f}";

/// Overall verdict shown in the summary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// At least one critical issue.
    Critical,
    /// At least one high issue.
    High,
    /// At least one medium issue.
    Medium,
    /// Nothing above low.
    Approved,
}

impl Status {
    /// Pick the status from the result's counters, most severe first.
    pub fn of(result: &AnalysisResult) -> Self {
        if result.critical_count > 0 {
            Status::Critical
        } else if result.high_count > 0 {
            Status::High
        } else if result.medium_count > 0 {
            Status::Medium
        } else {
            Status::Approved
        }
    }

    /// Header emoji.
    pub fn emoji(self) -> &'static str {
        match self {
            Status::Critical => Severity::Critical.emoji(),
            Status::High => Severity::High.emoji(),
            Status::Medium => Severity::Medium.emoji(),
            Status::Approved => "\u{1f7e2}",
        }
    }

    /// Short verdict text.
    pub fn text(self) -> &'static str {
        match self {
            Status::Critical => "Problemas críticos encontrados",
            Status::High => "Problemas importantes encontrados",
            Status::Medium => "Sugestões de melhoria",
            Status::Approved => "Código aprovado",
        }
    }
}

/// Render the markdown summary comment for the PR.
///
/// The table uses the model's own counters for critical, high, and medium,
/// and counts low issues from the issue list. At most `issue_limit` issues
/// are listed.
///
/// # Examples
///
/// ```
/// use crivo_core::AnalysisResult;
/// use crivo_review::format::format_summary;
///
/// let md = format_summary(&AnalysisResult::empty("Tudo certo."), 10);
/// assert!(md.starts_with("## 🟢 AI Code Review"));
/// assert!(md.contains("Tudo certo."));
/// ```
pub fn format_summary(result: &AnalysisResult, issue_limit: usize) -> String {
    let status = Status::of(result);
    let mut out = String::new();

    let _ = write!(
        out,
        "## {} AI Code Review\n\n{}\n\n### Resumo\n\
         | Severidade | Quantidade |\n\
         |------------|------------|\n\
         | {} Crítico | {} |\n\
         | {} Alto | {} |\n\
         | {} Médio | {} |\n\
         | {} Baixo | {} |\n\n",
        status.emoji(),
        result.summary,
        Severity::Critical.emoji(),
        result.critical_count,
        Severity::High.emoji(),
        result.high_count,
        Severity::Medium.emoji(),
        result.medium_count,
        Severity::Low.emoji(),
        result.count_severity(Severity::Low),
    );

    if !result.issues.is_empty() {
        out.push_str("### Problemas Encontrados\n\n");
        for issue in result.issues.iter().take(issue_limit) {
            let line = issue.line.map(|l| l.to_string()).unwrap_or_default();
            let _ = writeln!(
                out,
                "- {} **{}** (`{}:{}`)",
                issue
                    .severity_level()
                    .map_or(UNKNOWN_SEVERITY, Severity::emoji),
                issue.title.as_deref().unwrap_or("Issue"),
                issue.path.as_deref().unwrap_or(""),
                line,
            );
        }
    }

    out.push_str("\n---\n*Review automático gerado por Claude AI*");
    out
}

/// Render one inline comment per issue, in order.
///
/// Missing lines default to 1 and missing categories to `Geral`.
///
/// # Examples
///
/// ```
/// use crivo_core::AnalysisResult;
/// use crivo_review::format::format_inline_comments;
///
/// let result: AnalysisResult = serde_json::from_str(
///     r#"{"issues":[{"path":"a.ts","line":3,"severity":"LOW","title":"Nome confuso"}]}"#,
/// ).unwrap();
/// let comments = format_inline_comments(&result);
/// assert_eq!(comments.len(), 1);
/// assert!(comments[0].body.starts_with("**🔵 MENOR**: Nome confuso"));
/// ```
pub fn format_inline_comments(result: &AnalysisResult) -> Vec<InlineComment> {
    result
        .issues
        .iter()
        .map(|issue| InlineComment {
            path: issue.path.clone().unwrap_or_default(),
            line: issue.line.unwrap_or(1),
            body: format!(
                "**{}**: {}\n\n{}\n\n*Categoria: {}*",
                issue
                    .severity_level()
                    .map_or(UNKNOWN_SEVERITY, Severity::comment_label),
                issue.title.as_deref().unwrap_or(""),
                issue.description.as_deref().unwrap_or(""),
                issue.category.as_deref().unwrap_or("Geral"),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(value: serde_json::Value) -> AnalysisResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn status_priority() {
        let r = result(json!({"critical_count": 1, "high_count": 3, "medium_count": 2}));
        assert_eq!(Status::of(&r), Status::Critical);
        let r = result(json!({"high_count": 1, "medium_count": 2}));
        assert_eq!(Status::of(&r), Status::High);
        let r = result(json!({"medium_count": 2}));
        assert_eq!(Status::of(&r), Status::Medium);
        assert_eq!(Status::of(&result(json!({}))), Status::Approved);
    }

    #[test]
    fn critical_summary_header() {
        let md = format_summary(&result(json!({"critical_count": 1, "high_count": 0})), 10);
        assert!(md.starts_with("## 🔴 AI Code Review\n\n"));
        assert!(md.contains("| 🔴 Crítico | 1 |"));
    }

    #[test]
    fn approved_summary_counts_low_issues() {
        let r = result(json!({
            "summary": "Pequenos ajustes.",
            "issues": [
                {"path": "a.ts", "line": 1, "severity": "LOW", "title": "A"},
                {"path": "b.ts", "line": 2, "severity": "INFO", "title": "B"},
                {"path": "c.ts", "line": 3, "severity": "LOW", "title": "C"},
            ]
        }));
        let md = format_summary(&r, 10);
        assert!(md.starts_with("## 🟢 AI Code Review"));
        assert!(md.contains("| 🔵 Baixo | 2 |"));
        assert!(md.contains("| 🟡 Médio | 0 |"));
        assert!(md.contains("- 🔵 **A** (`a.ts:1`)"));
        assert!(md.contains("- ℹ️ **B** (`b.ts:2`)"));
    }

    #[test]
    fn table_uses_model_counters_verbatim() {
        let r = result(json!({
            "high_count": 4,
            "issues": [{"severity": "HIGH", "title": "only one"}]
        }));
        assert!(format_summary(&r, 10).contains("| 🟠 Alto | 4 |"));
    }

    #[test]
    fn summary_lists_at_most_limit_issues() {
        let issues: Vec<_> = (0..15)
            .map(|i| json!({"path": "x.ts", "line": i, "severity": "MEDIUM", "title": format!("T{i}")}))
            .collect();
        let md = format_summary(&result(json!({"medium_count": 15, "issues": issues})), 10);
        assert_eq!(md.matches("- 🟡 **").count(), 10);
        assert!(md.contains("**T9**"));
        assert!(!md.contains("**T10**"));
    }

    #[test]
    fn summary_defaults_for_missing_fields() {
        let md = format_summary(&result(json!({"issues": [{}]})), 10);
        assert!(md.contains("- ℹ️ **Issue** (`:`)"));
    }

    #[test]
    fn summary_without_issues_has_no_list() {
        let md = format_summary(&result(json!({})), 10);
        assert!(!md.contains("### Problemas Encontrados"));
        assert!(md.contains("Review concluído."));
        assert!(md.ends_with("\n---\n*Review automático gerado por Claude AI*"));
    }

    #[test]
    fn inline_comment_body() {
        let r = result(json!({"issues": [{
            "path": "a.ts", "line": 10, "severity": "HIGH",
            "category": "Security", "title": "X", "description": "Y"
        }]}));
        let comments = format_inline_comments(&r);
        assert_eq!(
            comments,
            vec![InlineComment {
                path: "a.ts".into(),
                line: 10,
                body: "**🟠 IMPORTANTE**: X\n\nY\n\n*Categoria: Security*".into(),
            }]
        );
    }

    #[test]
    fn inline_comments_are_uncapped_and_ordered() {
        let issues: Vec<_> = (1..=25)
            .map(|i| json!({"path": format!("f{i}.py"), "line": i, "severity": "LOW"}))
            .collect();
        let comments = format_inline_comments(&result(json!({"issues": issues})));
        assert_eq!(comments.len(), 25);
        for (i, c) in comments.iter().enumerate() {
            assert_eq!(c.path, format!("f{}.py", i + 1));
            assert_eq!(c.line, i as u32 + 1);
        }
    }

    #[test]
    fn inline_comment_defaults() {
        let comments = format_inline_comments(&result(json!({"issues": [{}]})));
        assert_eq!(comments[0].path, "");
        assert_eq!(comments[0].line, 1);
        assert!(comments[0].body.starts_with("**ℹ️ INFO**: "));
        assert!(comments[0].body.ends_with("*Categoria: Geral*"));
    }

    #[test]
    fn severity_labels_must_be_uppercase() {
        let r = result(json!({"issues": [
            {"severity": "low", "title": "a"},
            {"severity": "High", "title": "b"},
        ]}));
        let md = format_summary(&r, 10);
        assert!(md.contains("| 🔵 Baixo | 0 |"));
        assert!(md.contains("- ℹ️ **b** (`:`)"));

        let comments = format_inline_comments(&r);
        assert!(comments[1].body.starts_with("**ℹ️**: b"));
    }

    #[test]
    fn unknown_severity_gets_bare_marker() {
        let r = result(json!({"issues": [{"severity": "BLOCKER", "title": "x"}]}));
        let comments = format_inline_comments(&r);
        assert!(comments[0].body.starts_with("**ℹ️**: x"));
        assert!(format_summary(&r, 10).contains("- ℹ️ **x**"));
    }
}
