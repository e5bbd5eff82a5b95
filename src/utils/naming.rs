//! Naming helpers shared by the schema generator and the translator.
//!
//! All generated type and root-field names are derived here so that the two
//! engines can never disagree about what a name looks like.

/// Uppercase the first character, leaving the rest untouched.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Lowercase the first character, leaving the rest untouched.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Deterministic plural of a type name, camel-cased for use as a root field.
///
/// `Movie` becomes `movies`, `Company` becomes `companies`, `BlogPost`
/// becomes `blogPosts`. The rule is intentionally mechanical; a `plural`
/// directive on the type overrides it.
pub fn pluralize(type_name: &str) -> String {
    lower_first(&plural_suffix(type_name))
}

fn plural_suffix(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        if !stem.is_empty() && !ends_with_vowel(stem) {
            return format!("{}ies", stem);
        }
    }
    if name.ends_with('s')
        || name.ends_with('x')
        || name.ends_with('z')
        || name.ends_with("ch")
        || name.ends_with("sh")
    {
        return format!("{}es", name);
    }
    format!("{}s", name)
}

fn ends_with_vowel(s: &str) -> bool {
    matches!(
        s.chars().last(),
        Some('a') | Some('e') | Some('i') | Some('o') | Some('u')
    )
}
