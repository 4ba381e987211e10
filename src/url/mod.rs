//! URL handling module for url-harvest
//!
//! Only the URL to filename mapping lives here; artifact names are a pure
//! function of the URL string.

mod slug;

pub use slug::{slugify, url_to_filename, ARTIFACT_EXTENSION, MAX_SLUG_LEN};
