//! Package-name glob matching.
//!
//! The vocabulary here (`*`, `prefix*`, `@scope/*`, exact) is narrower than
//! a filesystem glob: it doesn't need `wax`'s or `globset`'s full
//! brace/character-class grammar, so it's implemented directly rather than
//! pulled from either — four string comparisons cover the whole grammar
//! the spec defines.

pub fn matches(name: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if let Some(scope) = pattern.strip_suffix("/*") {
        return name.strip_prefix(scope).map(|rest| rest.starts_with('/')).unwrap_or(false);
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix);
    }

    name == pattern
}

pub fn matches_any<'a>(name: &str, patterns: impl IntoIterator<Item = &'a str>) -> bool {
    patterns.into_iter().any(|pattern| matches(name, pattern))
}

#[cfg(test)]
#[path = "./glob.test.rs"]
mod tests;
