use std::path::Path;

/// Keep the lines of `raw` that name a file with one of `extensions`.
///
/// Lines are trimmed and empty ones dropped. Extensions carry a leading dot
/// and are compared case-sensitively. Input order is preserved and
/// duplicates are kept.
///
/// # Examples
///
/// ```
/// use crivo_review::filter::filter_code_files;
///
/// let exts = [".ts".to_string(), ".py".to_string()];
/// let files = filter_code_files("src/a.ts\nREADME.md\n  tools/b.py \n\n", &exts);
/// assert_eq!(files, vec!["src/a.ts", "tools/b.py"]);
/// ```
pub fn filter_code_files(raw: &str, extensions: &[String]) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| has_allowed_extension(line, extensions))
        .map(String::from)
        .collect()
}

fn has_allowed_extension(path: &str, extensions: &[String]) -> bool {
    let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.strip_prefix('.') == Some(ext))
}
