//! URL to artifact filename mapping
//!
//! Artifact names are derived from the URL text alone so the same URL maps to
//! the same file on every run. Resumption depends on that.

/// Maximum length of the slug part of an artifact filename
pub const MAX_SLUG_LEN: usize = 200;

/// Extension appended to every artifact filename
pub const ARTIFACT_EXTENSION: &str = ".txt";

/// Converts a string into a lowercase, dash-separated ASCII slug
///
/// ASCII letters, digits and `_` are kept (lowercased). `&` and `@` are
/// spelled out in place, quotes are dropped, and every other run of
/// characters collapses into a single `-`. Leading and trailing `-` and `_`
/// are stripped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            'a'..='z' | '0'..='9' | '_' => slug.push(c),
            'A'..='Z' => slug.push(c.to_ascii_lowercase()),
            '&' => slug.push_str("and"),
            '@' => slug.push_str("at"),
            '\'' | '"' | '\u{2019}' => {}
            _ => {
                if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
        }
    }

    slug.trim_matches(&['-', '_'][..]).to_string()
}

/// Maps a URL to its artifact filename
///
/// The slug is truncated to [`MAX_SLUG_LEN`] characters before the `.txt`
/// extension is appended, so the result is at most 204 characters long.
/// Distinct URLs may collide; that is tolerated.
///
/// # Example
///
/// ```
/// use url_harvest::url::url_to_filename;
///
/// assert_eq!(
///     url_to_filename("https://Example.com/a/b?q=1"),
///     "https-example-com-a-b-q-1.txt"
/// );
/// ```
pub fn url_to_filename(url: &str) -> String {
    let mut slug = slugify(url);
    // slugify only emits ASCII, so byte truncation is safe
    slug.truncate(MAX_SLUG_LEN);
    format!("{}{}", slug, ARTIFACT_EXTENSION)
}
