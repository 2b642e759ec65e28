//! Locating the JSON payload inside a model reply.
//!
//! Models often wrap the requested JSON in a markdown fence despite being told
//! not to. Extractors are tried in order and the first match wins.

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

type Extractor = fn(&str) -> Option<&str>;

/// Extraction strategies, in priority order.
const EXTRACTORS: &[Extractor] = &[json_fenced, any_fenced, raw];

/// Return the slice of `reply` that should hold the JSON object, trimmed.
///
/// A ```` ```json ```` fence anywhere in the reply wins; otherwise the first
/// plain fence; otherwise the whole reply. An unterminated fence runs to the
/// end of the reply.
///
/// # Examples
///
/// ```
/// use crivo_review::extract::extract_json_payload;
///
/// let reply = "Segue o review:\n```json\n{\"issues\": []}\n```\nObrigado!";
/// assert_eq!(extract_json_payload(reply), "{\"issues\": []}");
/// assert_eq!(extract_json_payload("  {\"a\": 1}\n"), "{\"a\": 1}");
/// ```
pub fn extract_json_payload(reply: &str) -> &str {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(reply))
        .unwrap_or(reply)
        .trim()
}

fn json_fenced(reply: &str) -> Option<&str> {
    between(reply, JSON_FENCE)
}

fn any_fenced(reply: &str) -> Option<&str> {
    between(reply, FENCE)
}

fn raw(reply: &str) -> Option<&str> {
    Some(reply)
}

/// Text after the first `open` up to the next plain fence, or to the end.
fn between<'a>(reply: &'a str, open: &str) -> Option<&'a str> {
    let start = reply.find(open)? + open.len();
    let rest = &reply[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(&rest[..end])
}
