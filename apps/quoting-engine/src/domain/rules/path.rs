//! JSONPath subset used to read nested fact values.
//!
//! Supported: `$`, `.key`, `['quoted key']`, `[index]`, `[*]` and `.*`.
//! A leading `$` is optional.

use serde_json::Value;

use super::RuleLoadError;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
    /// Every element of an array or every member value of an object.
    Wildcard,
}

/// A parsed fact path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactPath {
    segments: Vec<PathSegment>,
}

impl FactPath {
    /// The root path, selecting the whole fact.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Parse a path expression.
    pub fn parse(path: &str) -> Result<Self, RuleLoadError> {
        let invalid = |message: &str| RuleLoadError::InvalidPath {
            path: path.to_string(),
            message: message.to_string(),
        };

        let chars: Vec<char> = path.trim().chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        if chars.first() == Some(&'$') {
            i = 1;
        } else if !chars.is_empty() && chars[0] != '.' && chars[0] != '[' {
            // bare `a.b` form: treat as `$.a.b`
            let (key, next) = read_key(&chars, 0);
            segments.push(PathSegment::Key(key));
            i = next;
        }

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (key, next) = read_key(&chars, i + 1);
                    if key.is_empty() {
                        return Err(invalid("empty member name"));
                    }
                    segments.push(if key == "*" {
                        PathSegment::Wildcard
                    } else {
                        PathSegment::Key(key)
                    });
                    i = next;
                }
                '[' => {
                    let close_search_from = i + 1;
                    match chars.get(close_search_from) {
                        Some(&quote) if quote == '\'' || quote == '"' => {
                            let start = close_search_from + 1;
                            let end = chars[start..]
                                .iter()
                                .position(|&c| c == quote)
                                .map(|offset| start + offset)
                                .ok_or_else(|| invalid("unterminated quoted key"))?;
                            if chars.get(end + 1) != Some(&']') {
                                return Err(invalid("expected ']' after quoted key"));
                            }
                            segments.push(PathSegment::Key(chars[start..end].iter().collect()));
                            i = end + 2;
                        }
                        _ => {
                            let end = chars[close_search_from..]
                                .iter()
                                .position(|&c| c == ']')
                                .map(|offset| close_search_from + offset)
                                .ok_or_else(|| invalid("unterminated '['"))?;
                            let inner: String =
                                chars[close_search_from..end].iter().collect();
                            let inner = inner.trim();
                            if inner == "*" {
                                segments.push(PathSegment::Wildcard);
                            } else {
                                let index = inner
                                    .parse::<usize>()
                                    .map_err(|_| invalid("index must be a non-negative integer"))?;
                                segments.push(PathSegment::Index(index));
                            }
                            i = end + 1;
                        }
                    }
                }
                _ => return Err(invalid("expected '.' or '['")),
            }
        }

        Ok(Self { segments })
    }

    /// Returns true if the path can select more than one value.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PathSegment::Wildcard)
    }

    /// Select the value at this path.
    ///
    /// Paths without a wildcard yield the single match or `null`. Wildcard
    /// paths yield an array of all matches, or `null` when nothing matched.
    #[must_use]
    pub fn select(&self, value: &Value) -> Value {
        let mut current: Vec<&Value> = vec![value];
        for segment in &self.segments {
            let mut next = Vec::new();
            for item in current {
                match segment {
                    PathSegment::Key(key) => {
                        if let Some(found) = item.as_object().and_then(|m| m.get(key)) {
                            next.push(found);
                        }
                    }
                    PathSegment::Index(index) => {
                        if let Some(found) = item.as_array().and_then(|a| a.get(*index)) {
                            next.push(found);
                        }
                    }
                    PathSegment::Wildcard => match item {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                }
            }
            current = next;
        }

        if self.has_wildcard() {
            if current.is_empty() {
                Value::Null
            } else {
                Value::Array(current.into_iter().cloned().collect())
            }
        } else {
            current.first().map_or(Value::Null, |v| (*v).clone())
        }
    }
}

fn read_key(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start..]
        .iter()
        .position(|&c| c == '.' || c == '[')
        .map_or(chars.len(), |offset| start + offset);
    (chars[start..end].iter().collect(), end)
}
