//! Naming helpers
//!
//! Kubernetes resource-name sanitization, object-key joining and sidecar
//! name globbing. All of these are pure string functions.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^-0-9a-z]+").expect("static regex"));

static DISALLOWED_MIXED: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^-_0-9A-Za-z]+").expect("static regex"));

static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("-+").expect("static regex"));

/// Sanitize a string into a Kubernetes-compatible resource name
///
/// Runs of disallowed characters collapse into a single `-`, and leading or
/// trailing dashes are trimmed. Unless `allow_capital_underscore` is set the
/// input is lowercased first and `_` counts as disallowed.
///
/// # Examples
/// ```
/// use kfx_dsl::sanitize_k8s_name;
///
/// assert_eq!(sanitize_k8s_name("mlpipeline_ui_metadata", false), "mlpipeline-ui-metadata");
/// assert_eq!(sanitize_k8s_name("Test Op!", false), "test-op");
/// assert_eq!(sanitize_k8s_name("My_Op", true), "My_Op");
/// ```
#[must_use]
pub fn sanitize_k8s_name(name: &str, allow_capital_underscore: bool) -> String {
    let replaced = if allow_capital_underscore {
        DISALLOWED_MIXED.replace_all(name, "-").into_owned()
    } else {
        DISALLOWED_LOWER
            .replace_all(&name.to_lowercase(), "-")
            .into_owned()
    };
    DASH_RUNS
        .replace_all(&replaced, "-")
        .trim_matches('-')
        .to_string()
}

/// Join two object-key segments with `/`
///
/// Mirrors POSIX path joining: an absolute `tail` replaces `base`, an empty
/// `base` yields `tail`, and no separator is doubled when `base` already ends
/// with one.
#[must_use]
pub fn join_key(base: &str, tail: &str) -> String {
    if tail.starts_with('/') || base.is_empty() {
        tail.to_string()
    } else if base.ends_with('/') {
        format!("{base}{tail}")
    } else {
        format!("{base}/{tail}")
    }
}

/// Shell-style glob used to select sidecars by name
///
/// Supports `*`, `?`, `[seq]` and `[!seq]`. An unterminated `[` matches a
/// literal bracket. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    matcher: Option<Regex>,
}

impl GlobPattern {
    /// Compile a glob pattern
    ///
    /// A pattern whose character class cannot be compiled (for example a
    /// reversed range such as `[z-a]`) falls back to literal equality.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let matcher = match Regex::new(&translate_glob(pattern)) {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::warn!("Glob pattern {:?} not compilable, matching literally: {}", pattern, err);
                None
            }
        };
        Self {
            pattern: pattern.to_string(),
            matcher,
        }
    }

    /// Original pattern text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check whether `name` matches the pattern
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Some(regex) => regex.is_match(name),
            None => self.pattern == name,
        }
    }
}

impl Default for GlobPattern {
    fn default() -> Self {
        Self::new("*")
    }
}

fn translate_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                    continue;
                }

                let mut class = String::from("[");
                let mut body = &chars[i..j];
                if let Some(('!', rest)) = body.split_first() {
                    class.push('^');
                    body = rest;
                }
                for &member in body {
                    match member {
                        '\\' | '[' | ']' | '&' | '~' | '^' => {
                            class.push('\\');
                            class.push(member);
                        }
                        _ => class.push(member),
                    }
                }
                class.push(']');
                out.push_str(&class);
                i = j + 1;
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_collapses() {
        assert_eq!(sanitize_k8s_name("Hello__World", false), "hello-world");
        assert_eq!(sanitize_k8s_name("--a--b--", false), "a-b");
        assert_eq!(sanitize_k8s_name("markdown_data", false), "markdown-data");
        assert_eq!(sanitize_k8s_name("", false), "");
    }

    #[test]
    fn sanitize_keeps_capitals_when_allowed() {
        assert_eq!(sanitize_k8s_name("Some Name_x", true), "Some-Name_x");
        assert_eq!(sanitize_k8s_name("!!A!!", true), "A");
    }

    #[test]
    fn join_key_behaves_like_posix_join() {
        assert_eq!(
            join_key("artifacts/", "{{workflow.name}}/{{pod.name}}"),
            "artifacts/{{workflow.name}}/{{pod.name}}"
        );
        assert_eq!(join_key("", "a/b"), "a/b");
        assert_eq!(join_key("a", "b"), "a/b");
        assert_eq!(join_key("a", "/abs"), "/abs");
        assert_eq!(join_key("a", ""), "a/");
    }

    #[test]
    fn glob_star_and_question() {
        let any = GlobPattern::default();
        assert!(any.matches("foo"));
        assert!(any.matches(""));

        let f_star = GlobPattern::new("f*");
        assert!(f_star.matches("foo"));
        assert!(!f_star.matches("bar"));

        let q = GlobPattern::new("ba?");
        assert!(q.matches("bar"));
        assert!(!q.matches("barn"));
    }

    #[test]
    fn glob_classes() {
        let class = GlobPattern::new("[bf]oo");
        assert!(class.matches("foo"));
        assert!(class.matches("boo"));
        assert!(!class.matches("zoo"));

        let negated = GlobPattern::new("[!b]*");
        assert!(negated.matches("foo"));
        assert!(!negated.matches("bar"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let dotted = GlobPattern::new("a.b");
        assert!(dotted.matches("a.b"));
        assert!(!dotted.matches("axb"));

        let unterminated = GlobPattern::new("a[b");
        assert!(unterminated.matches("a[b"));
    }

    #[test]
    fn glob_bad_range_matches_literally() {
        let reversed = GlobPattern::new("[z-a]");
        assert!(reversed.matches("[z-a]"));
        assert!(!reversed.matches("b"));
    }
}
