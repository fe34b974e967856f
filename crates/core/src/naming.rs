//! Case conversion and name derivation helpers.
//!
//! Package paths, accessor names and request type names all flow through
//! here so that every backend sees the same stable names for the same source
//! node.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Module path segments that collide with target-language standard modules
/// or keywords, and their stable replacements.
static RESERVED_SEGMENTS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("type", "types"),
        ("mod", "mod_"),
        ("self", "self_"),
        ("super", "super_"),
        ("crate", "crate_"),
        ("std", "std_"),
        ("common", "common_"),
    ]
    .into_iter()
    .collect()
});

/// Uppercase the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lowercase the first character.
pub fn decapitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Split a name into words on `-`, `_`, `.`, space and lower/upper case
/// boundaries. Words come out lowercase.
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if matches!(c, '-' | '_' | '.' | ' ' | '/') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            current.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `lower_snake_case` form of a name.
pub fn snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// `UpperCamelCase` form of a name.
pub fn upper_camel_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| capitalize_first(w))
        .collect()
}

/// `lowerCamelCase` form of a name.
pub fn lower_camel_case(s: &str) -> String {
    decapitalize_first(&upper_camel_case(s))
}

/// A single package segment: snake_cased with reserved segments renamed.
pub fn module_segment(s: &str) -> String {
    let snake = snake_case(s);
    match RESERVED_SEGMENTS.get(snake.as_str()) {
        Some(renamed) => (*renamed).to_string(),
        None => snake,
    }
}

/// A full package path: split on `/` or `.`, each segment normalized,
/// re-joined with `/`. Pure and stable across backends.
pub fn module_path(namespace: &str) -> String {
    namespace
        .split(['/', '.'])
        .filter(|s| !s.is_empty())
        .map(module_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive a resource/request name from a URI template: literal segments are
/// upper-camel-cased, variable segments become `By` + the variable name,
/// e.g. `/things/{thingId}` yields `ThingsByThingId`.
pub fn uri_to_name(template: &str) -> String {
    let mut name = String::new();
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        if let Some(var) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            name.push_str("By");
            name.push_str(&upper_camel_case(var));
        } else {
            name.push_str(&upper_camel_case(segment));
        }
    }
    name
}
