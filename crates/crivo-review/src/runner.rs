use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crivo_core::{CrivoConfig, CrivoError, ReviewOutput, Severity};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::analyze::analyze;
use crate::artifacts::{read_text, Artifacts};
use crate::filter::filter_code_files;
use crate::format::{format_inline_comments, format_summary};
use crate::llm::ReviewModel;
use crate::prompt::{build_review_prompt, PromptInput};

const NO_CHANGES_SUMMARY: &str =
    "## \u{1f7e2} AI Code Review\n\nNenhum arquivo de código modificado neste PR.";

/// Which branch a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No reviewable file changed; a canned result was written.
    NoChanges,
    /// The model reviewed the changes.
    Analyzed,
}

/// What a run wrote, for the console and the exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Branch taken.
    pub outcome: Outcome,
    /// Code files that passed the change filter.
    pub files_reviewed: usize,
    /// Inline comments written.
    pub comments: usize,
    /// Critical count written to the output.
    pub critical_count: u32,
    /// High count written to the output.
    pub high_count: u32,
    /// Issues written to the output.
    pub total_issues: usize,
    /// Where the result was written.
    pub output_path: PathBuf,
}

impl RunReport {
    /// Whether the written counters reach `threshold`.
    ///
    /// Only critical and high are tracked in the output, so any lower
    /// threshold behaves like `High`.
    pub fn meets(&self, threshold: Severity) -> bool {
        if Severity::Critical.meets_threshold(threshold) && self.critical_count > 0 {
            return true;
        }
        Severity::High.meets_threshold(threshold) && self.high_count > 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "Críticos: {}", self.critical_count)?;
        writeln!(f, "Altos: {}", self.high_count)?;
        write!(f, "Total issues: {}", self.total_issues)
    }
}

/// Single-pass review run over the artifacts in a working directory.
///
/// The model is an explicit dependency so tests can pass a fake.
pub struct Runner<M> {
    model: M,
    config: CrivoConfig,
    workdir: PathBuf,
    output: Option<PathBuf>,
}

impl<M: ReviewModel> Runner<M> {
    /// Create a runner reading artifacts from `workdir`.
    pub fn new(model: M, config: CrivoConfig, workdir: impl Into<PathBuf>) -> Self {
        Self {
            model,
            config,
            workdir: workdir.into(),
            output: None,
        }
    }

    /// Write the result to `path` instead of the configured output name.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Path the result will be written to.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self.workdir.join(&self.config.artifacts.output),
        }
    }

    /// Run the review and write the result file.
    ///
    /// Artifact and model failures degrade to an empty review; the result
    /// file is always written.
    ///
    /// # Errors
    ///
    /// Returns [`CrivoError`] only if the result file cannot be written.
    pub async fn run(&self) -> Result<RunReport, CrivoError> {
        println!("\u{1f50d} Iniciando AI Code Review...");

        let artifacts = &self.config.artifacts;
        let changed = read_text(&self.workdir.join(&artifacts.changed_files));
        let files = filter_code_files(&changed, &self.config.review.extensions);
        let output_path = self.output_path();

        if files.is_empty() {
            println!("Nenhum arquivo de código modificado");
            let output = ReviewOutput::no_changes(NO_CHANGES_SUMMARY);
            write_output(&output_path, &output)?;
            return Ok(RunReport {
                outcome: Outcome::NoChanges,
                files_reviewed: 0,
                comments: 0,
                critical_count: 0,
                high_count: 0,
                total_issues: 0,
                output_path,
            });
        }

        println!("\u{1f4c1} Arquivos modificados: {}", files.len());

        let collected = Artifacts::collect(&self.workdir, artifacts);
        let prompt = build_review_prompt(
            &PromptInput {
                diff: &collected.diff,
                files: &files,
                typecheck: &collected.typecheck,
                lint: &collected.lint,
            },
            &self.config.review,
        );
        debug!(prompt_chars = prompt.chars().count(), "prompt built");

        println!("\u{1f916} Analisando com Claude...");
        let spinner = spinner("aguardando o modelo");
        let mut analysis = analyze(&self.model, &prompt).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        if !analysis.counters_match_issues() {
            if self.config.review.recount_severities {
                debug!("recounting severities from the issue list");
                analysis.recount();
            } else {
                warn!(
                    critical = analysis.critical_count,
                    high = analysis.high_count,
                    medium = analysis.medium_count,
                    "model counters disagree with its issue list; keeping the model's counters"
                );
            }
        }

        let output = ReviewOutput {
            summary: format_summary(&analysis, self.config.review.summary_issue_limit),
            comments: format_inline_comments(&analysis),
            critical_count: analysis.critical_count,
            high_count: analysis.high_count,
            issues: analysis.issues,
        };
        write_output(&output_path, &output)?;

        println!(
            "\u{2705} Review concluído: {} comentários gerados",
            output.comments.len()
        );

        Ok(RunReport {
            outcome: Outcome::Analyzed,
            files_reviewed: files.len(),
            comments: output.comments.len(),
            critical_count: output.critical_count,
            high_count: output.high_count,
            total_issues: output.issues.len(),
            output_path,
        })
    }
}

fn spinner(message: &'static str) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn write_output(path: &Path, output: &ReviewOutput) -> Result<(), CrivoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(output)?;
    std::fs::write(path, content)?;
    debug!(path = %path.display(), "review result written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(critical: u32, high: u32) -> RunReport {
        RunReport {
            outcome: Outcome::Analyzed,
            files_reviewed: 1,
            comments: 0,
            critical_count: critical,
            high_count: high,
            total_issues: 0,
            output_path: PathBuf::from("review-result.json"),
        }
    }

    #[test]
    fn meets_critical_threshold() {
        assert!(report(1, 0).meets(Severity::Critical));
        assert!(!report(0, 3).meets(Severity::Critical));
    }

    #[test]
    fn meets_high_threshold() {
        assert!(report(0, 1).meets(Severity::High));
        assert!(report(2, 0).meets(Severity::High));
        assert!(!report(0, 0).meets(Severity::High));
        assert!(report(0, 1).meets(Severity::Low));
    }

    #[test]
    fn display_prints_counts() {
        let text = report(2, 5).to_string();
        assert!(text.contains("Críticos: 2"));
        assert!(text.contains("Altos: 5"));
        assert!(text.ends_with("Total issues: 0"));
    }

    #[test]
    fn write_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/review-result.json");
        write_output(&path, &ReviewOutput::no_changes("x")).unwrap();
        let written: ReviewOutput =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.summary, "x");
    }
}
