/*
 * inflect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! English pluralization for derived collection and element names.
//!
//! Suffix rules plus small irregular/uncountable tables, no regex.

/// Irregular singular → plural pairs.
static IRREGULARS: &[(&str, &str)] = &[
    ("analysis", "analyses"),
    ("child", "children"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("index", "indices"),
    ("man", "men"),
    ("matrix", "matrices"),
    ("medium", "media"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("quiz", "quizzes"),
    ("tooth", "teeth"),
    ("vertex", "vertices"),
    ("woman", "women"),
];

/// Words that are the same in singular and plural form. Sorted for binary
/// search.
static UNCOUNTABLE: &[&str] = &[
    "deer",
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
];

/// Convert a singular English word to its plural form.
///
/// Only the last `_`-separated segment is inflected, so `blog_post`
/// becomes `blog_posts`.
pub fn pluralize(word: &str) -> String {
    inflect_last_segment(word, pluralize_word)
}

/// Convert a plural English word to its singular form.
pub fn singularize(word: &str) -> String {
    inflect_last_segment(word, singularize_word)
}

fn inflect_last_segment(word: &str, inflect: fn(&str) -> String) -> String {
    match word.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => format!("{head}_{}", inflect(last)),
        _ => inflect(word),
    }
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.binary_search(&word).is_ok() {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULARS.iter().find(|(singular, _)| *singular == word) {
        return plural.to_string();
    }
    if IRREGULARS.iter().any(|(_, plural)| *plural == word) {
        return word.to_string();
    }

    let bytes = word.as_bytes();
    let last = bytes[bytes.len() - 1];
    let before_last = bytes.len().checked_sub(2).map(|i| bytes[i]);

    if last == b'y' && before_last.is_some_and(|c| !is_vowel(c)) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if word.ends_with("fe") {
        return format!("{}ves", &word[..word.len() - 2]);
    }
    if matches!(last, b's' | b'x' | b'z') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }
    format!("{word}s")
}

fn singularize_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.binary_search(&word).is_ok() {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULARS.iter().find(|(_, plural)| *plural == word) {
        return singular.to_string();
    }
    if IRREGULARS.iter().any(|(singular, _)| *singular == word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ves") {
        if !stem.is_empty() {
            return format!("{stem}fe");
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if stem.ends_with("ch")
            || stem.ends_with("sh")
            || stem.ends_with('x')
            || stem.ends_with('z')
            || stem.ends_with("ss")
        {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() && !stem.ends_with('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("people"), "people");
        assert_eq!(pluralize("sheep"), "sheep");
        assert_eq!(pluralize("blog_post"), "blog_posts");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("person"), "person");
        assert_eq!(singularize("news"), "news");
        assert_eq!(singularize("blog_posts"), "blog_post");
    }
}
