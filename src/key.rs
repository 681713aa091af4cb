//! Full-key composition and identifier normalization.
//!
//! A full key is the `/`-joined list of node names from the document root to a node.
//! Branch elements are named by their position, so `servers/0/host` addresses the `host`
//! field of the first element of the `servers` branch.

use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Separator between the segments of a full key.
pub const SEPARATOR: &str = "/";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9]").expect("valid non-alphanumeric regex"));
static FIRST_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(.)([A-Z][a-z]+)").expect("valid first-cap regex"));
static ALL_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z0-9])([A-Z])").expect("valid all-cap regex"));
static MULTIPLE_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("_{2,}").expect("valid underscore regex"));

/// Joins a parent full key and a local name.
///
/// # Examples
///
/// ```rust
/// use kvtree::key::make_full_key;
///
/// assert_eq!(make_full_key("", "server"), "server");
/// assert_eq!(make_full_key("server", "port"), "server/port");
/// ```
#[must_use]
pub fn make_full_key(parent_full_key: &str, name: &str) -> String {
    if parent_full_key.is_empty() {
        return name.to_string();
    }
    let mut full_key = String::with_capacity(parent_full_key.len() + SEPARATOR.len() + name.len());
    full_key.push_str(parent_full_key);
    full_key.push_str(SEPARATOR);
    full_key.push_str(name);
    full_key
}

/// Returns the parent full key and local name of a full key.
///
/// Keys without a separator have no parent.
#[must_use]
pub fn split_parent(full_key: &str) -> Option<(&str, &str)> {
    full_key.rsplit_once(SEPARATOR)
}

/// Finds which child of the node at `own_full_key` leads towards `query`.
///
/// Returns `Ok(None)` when `query` addresses the node itself and `Ok(Some(segment))` with the
/// name of the child otherwise. A query that is empty or lies outside the node fails with
/// [`Error::NotFound`].
pub(crate) fn descend<'k>(own_full_key: &str, query: &'k str) -> Result<Option<&'k str>> {
    if query.is_empty() {
        return Err(Error::not_found(query));
    }
    if own_full_key == query {
        return Ok(None);
    }

    let relative = if own_full_key.is_empty() {
        query
    } else {
        query
            .strip_prefix(own_full_key)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .ok_or_else(|| Error::not_found(query))?
    };

    let segment = match relative.split_once(SEPARATOR) {
        Some((head, _)) => head,
        None => relative,
    };
    Ok(Some(segment))
}

/// Converts an identifier to `snake_case`.
///
/// Runs of non-alphanumeric characters become a single underscore, an underscore is inserted
/// before capitalized words and between a lowercase letter or digit and a capital, and the
/// result is trimmed of underscores and lowercased. Applying it twice gives the same result as
/// applying it once.
///
/// # Examples
///
/// ```rust
/// use kvtree::key::to_snake_case;
///
/// assert_eq!(to_snake_case("maxIdleConns"), "max_idle_conns");
/// assert_eq!(to_snake_case("HTTPServer"), "http_server");
/// assert_eq!(to_snake_case("--log.level--"), "log_level");
/// assert_eq!(to_snake_case(&to_snake_case("JSONData")), to_snake_case("JSONData"));
/// ```
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let s = NON_ALPHANUMERIC.replace_all(s, "_");
    let s = FIRST_CAP.replace_all(&s, "${1}_${2}");
    let s = ALL_CAP.replace_all(&s, "${1}_${2}");
    let s = MULTIPLE_UNDERSCORES.replace_all(&s, "_");
    s.trim_matches('_').to_lowercase()
}
