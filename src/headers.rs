//! Header storage, normalization and the small value predicates that
//! framing decisions (`chunked`, `close`, `100-continue`) depend on.

use indexmap::IndexMap;

/// `true` if `value`, trimmed of surrounding whitespace, equals `token`
/// case-insensitively.
///
/// Generalized from the teacher's `is_chunked`/`is_close`/`is_continue`
/// triplet: those each hand-rolled the same trim-then-compare walk for a
/// single literal. A `Transfer-Encoding`/`Connection` header may carry a
/// comma-separated list, so callers match this against one element of the
/// list (e.g. the last one for `Transfer-Encoding`), not the whole value.
pub fn token_equals_ci(value: &str, token: &str) -> bool {
    value.trim().eq_ignore_ascii_case(token)
}

/// An ordered `name -> value` mapping with HTTP's header-combination and
/// folding rules baked in.
///
/// Duplicate names are combined by appending `","` then the new value,
/// preserving arrival order of distinct names. A folded continuation line
/// extends whichever entry was inserted most recently, even if that entry
/// already held a combined value.
#[derive(Debug, Default, Clone)]
pub struct HeaderBlock {
    entries: IndexMap<String, String>,
    last_inserted: Option<String>,
}

impl HeaderBlock {
    pub fn new() -> HeaderBlock {
        HeaderBlock { entries: IndexMap::new(), last_inserted: None }
    }

    /// Insert `value` under `name`, combining with any prior value for the
    /// same name per the `","`-join rule.
    pub fn insert_or_append(&mut self, name: String, value: &str) {
        match self.entries.get_mut(&name) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(value);
            }
            None => {
                self.entries.insert(name.clone(), value.to_string());
            }
        }
        self.last_inserted = Some(name);
    }

    /// Extend the most recently inserted entry's value with a folded
    /// continuation line (already left-trimmed by the caller). Returns
    /// `false` if there is no prior header to fold onto (the caller turns
    /// that into a `BadRequest`/`BadResponse`).
    pub fn fold_last(&mut self, continuation: &str) -> bool {
        let Some(key) = self.last_inserted.clone() else {
            return false;
        };
        if let Some(existing) = self.entries.get_mut(&key) {
            existing.push_str(continuation);
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for HeaderBlock {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Split a header (or trailer) line into its name and value.
///
/// RFC 7230 requires exactly `name ":" OWS value`, but real traffic (and
/// the teacher's own parser) tolerates any amount of whitespace after the
/// colon, so the delimiter recognized here is `:` plus however much space
/// follows it, not the literal two-byte `": "`.
pub fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let name = &line[..colon];
    if name.is_empty() {
        return None;
    }
    let value = line[colon + 1..].trim_start();
    Some((name, value))
}

/// Normalize a header name into the server-facing "environment" form used
/// by CGI-style request maps: uppercase, dashes become underscores, and the
/// result is prefixed with `HTTP_` — except `Content-Length` and
/// `Content-Type`, which become `CONTENT_LENGTH`/`CONTENT_TYPE` with no
/// prefix.
///
/// Trailers are always normalized this way, regardless of parser role (see
/// DESIGN.md for why this literal reading of the framing spec is kept even
/// though it means a client-mode chunked trailer uses a different casing
/// convention than the rest of that response's headers).
pub fn normalize_env_name(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect();
    match upper.as_str() {
        "CONTENT_LENGTH" | "CONTENT_TYPE" => upper,
        _ => format!("HTTP_{}", upper),
    }
}

/// Normalize a header name into the client-facing form: case-folded
/// (lowercased), otherwise unchanged.
pub fn normalize_client_name(name: &str) -> String {
    name.to_ascii_lowercase()
}
