/// Errors that can occur across crivo.
///
/// Library crates use this type directly; it also implements
/// [`miette::Diagnostic`] so the binary can render it with help text.
///
/// # Examples
///
/// ```
/// use crivo_core::CrivoError;
///
/// let err = CrivoError::Config("max_diff_chars must be positive".into());
/// assert!(err.to_string().contains("max_diff_chars"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CrivoError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The API credential is not set.
    #[error("{0} não configurada")]
    #[diagnostic(
        code(crivo::missing_credential),
        help("export the variable or set `api_key` under [llm] in .crivo.toml")
    )]
    MissingCredential(String),

    /// LLM client construction failure.
    #[error("LLM error: {0}")]
    Llm(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(crivo::config))]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CrivoError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn missing_credential_names_variable() {
        let err = CrivoError::MissingCredential("ANTHROPIC_API_KEY".into());
        assert_eq!(err.to_string(), "ANTHROPIC_API_KEY não configurada");
    }

    #[test]
    fn config_error_displays_message() {
        let err = CrivoError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }
}
