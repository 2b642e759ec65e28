use crivo_core::ReviewConfig;
use serde_json::Value;

const TRUNCATION_MARKER: &str = "\n... (diff truncado)";

const INSTRUCTIONS: &str = r#"## Instruções
Analise o código focando em:

1. **Segurança**: SQL injection, XSS, autenticação, validação de entrada
2. **Performance**: N+1 queries, loops ineficientes, falta de paginação
3. **Bugs**: Erros lógicos, edge cases não tratados, null/undefined
4. **Manutenibilidade**: Código duplicado, funções muito longas, nomes confusos
5. **TypeScript**: Tipos any desnecessários, validação em runtime

Para cada problema encontrado, retorne um JSON com este formato:
```json
{
  "summary": "Resumo geral do review em markdown (pt-BR)",
  "critical_count": 0,
  "high_count": 0,
  "medium_count": 0,
  "issues": [
    {
      "path": "caminho/do/arquivo.ts",
      "line": 42,
      "severity": "HIGH",
      "category": "Security",
      "title": "Título curto do problema",
      "description": "Descrição detalhada com sugestão de correção"
    }
  ]
}
```

IMPORTANTE:
- Responda APENAS com o JSON, sem texto adicional
- Use português brasileiro
- Seja específico sobre linhas e arquivos
- Inclua exemplos de código corrigido quando possível
- Se não houver problemas significativos, retorne issues vazio"#;

/// Inputs embedded in the review prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    /// Unified diff of the PR.
    pub diff: &'a str,
    /// Changed code files, already filtered.
    pub files: &'a [String],
    /// Type-checker log.
    pub typecheck: &'a str,
    /// Linter report.
    pub lint: &'a Value,
}

/// Build the single user prompt sent to the review model.
///
/// Each artifact is capped to the limits in `config`; an empty type-check
/// log or lint report is replaced by a placeholder.
///
/// # Examples
///
/// ```
/// use crivo_core::ReviewConfig;
/// use crivo_review::prompt::{build_review_prompt, PromptInput};
///
/// let files = vec!["src/a.ts".to_string()];
/// let lint = serde_json::json!({});
/// let prompt = build_review_prompt(
///     &PromptInput { diff: "+let x: any;", files: &files, typecheck: "", lint: &lint },
///     &ReviewConfig::default(),
/// );
/// assert!(prompt.contains("- src/a.ts"));
/// assert!(prompt.contains("+let x: any;"));
/// assert!(prompt.contains("Nenhum erro"));
/// ```
pub fn build_review_prompt(input: &PromptInput<'_>, config: &ReviewConfig) -> String {
    let file_list = input
        .files
        .iter()
        .take(config.max_prompt_files)
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");

    let diff = cap_diff(input.diff, config.max_diff_chars);

    let typecheck = if input.typecheck.is_empty() {
        "Nenhum erro"
    } else {
        truncate_chars(input.typecheck, config.max_typecheck_chars)
    };

    let lint = if is_empty_report(input.lint) {
        "Nenhum resultado".to_string()
    } else {
        let pretty = serde_json::to_string_pretty(input.lint).unwrap_or_default();
        truncate_chars(&pretty, config.max_lint_chars).to_string()
    };

    format!(
        "Você é um especialista em code review para um projeto CRM em TypeScript/Node.js.

## Contexto do Projeto
{context}

## Arquivos Modificados
{file_list}

## Diff do PR
```diff
{diff}
```

## Erros TypeScript
```
{typecheck}
```

## Resultados ESLint
{lint}

{INSTRUCTIONS}",
        context = config.project_context,
    )
}

fn cap_diff(diff: &str, max_chars: usize) -> String {
    let capped = truncate_chars(diff, max_chars);
    if capped.len() < diff.len() {
        format!("{capped}{TRUNCATION_MARKER}")
    } else {
        diff.to_string()
    }
}

/// Return at most the first `max` characters of `s`, on a char boundary.
///
/// # Examples
///
/// ```
/// use crivo_review::prompt::truncate_chars;
///
/// assert_eq!(truncate_chars("ação", 2), "aç");
/// assert_eq!(truncate_chars("abc", 10), "abc");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn is_empty_report(report: &Value) -> bool {
    match report {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
