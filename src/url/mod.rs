//! URL templating and filename helpers
//!
//! Listing and item URLs come from configuration as templates with `{name}`
//! placeholders. Titles coming back from the source are turned into safe file
//! names before they touch the filesystem.

use ::url::Url;

/// Substitutes `{key}` placeholders and parses the result as an absolute URL
///
/// # Examples
///
/// ```
/// use media_harvest::url::render_template;
///
/// let url = render_template(
///     "https://api.example.com/search?mid={collection}&pn={page}",
///     &[("collection", "42"), ("page", "3")],
/// )
/// .unwrap();
/// assert_eq!(url.as_str(), "https://api.example.com/search?mid=42&pn=3");
/// ```
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<Url, ::url::ParseError> {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        rendered = rendered.replace(&format!("{{{}}}", key), value);
    }
    Url::parse(&rendered)
}

/// Characters that are rejected in file names on at least one major platform
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turns an arbitrary title into a file name that is safe on common filesystems
///
/// Forbidden and control characters are dropped, surrounding whitespace and
/// trailing dots are trimmed, and the result is capped at 200 bytes on a char
/// boundary. An empty result means the caller should pick a fallback name.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !FORBIDDEN.contains(c))
        .collect();

    let mut trimmed = cleaned.trim().trim_end_matches('.').to_string();

    if trimmed.len() > 200 {
        let mut cut = 200;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        trimmed.truncate(cut);
    }

    trimmed
}
