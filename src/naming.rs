//! Naming resolver: catalog display names to collision-free file names
//!
//! Everything here is pure and total — resolution never fails, and for a
//! fixed sequence of inputs it always produces the same output. Occurrence
//! numbering is positional: jobs sharing a `(collection, slug)` key are
//! numbered 1..K in production order, so upstream reordering can shift the
//! numbers of later occurrences (see [`NameCounter`]).

use std::collections::HashMap;

/// Placeholder used when a display name slugs down to nothing
const UNKNOWN_NAME: &str = "Unknown";

/// Characters that are illegal in file names on at least one target platform
fn is_invalid_filename_char(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || (c as u32) < 0x20
}

/// Turn a display name into a file-name-safe slug
///
/// Colons become dashes (they read better than underscores in card titles),
/// every other illegal character becomes an underscore, and trailing spaces
/// and dots are stripped so Windows does not silently rename the file.
/// An empty result falls back to `"Unknown"`.
pub fn slugify(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| {
            if c == ':' {
                '-'
            } else if is_invalid_filename_char(c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_end_matches([' ', '.']);
    if trimmed.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Infer the output extension from a source URL
///
/// `.png` when the URL mentions png anywhere (the catalog serves PNGs from
/// paths like `/png/front/..`), `.jpg` otherwise.
pub fn infer_ext(url: &str) -> &'static str {
    if url.to_ascii_lowercase().contains(".png") {
        ".png"
    } else {
        ".jpg"
    }
}

/// Build the target file name for the k-th occurrence of a display name
///
/// Occurrence 1 gets no suffix; occurrence k > 1 gets the bare number:
/// `Bolt.jpg`, `Bolt2.jpg`, `Bolt3.jpg`, ...
pub fn target_filename(display_name: &str, occurrence: u32, ext: &str) -> String {
    let slug = slugify(display_name);
    if occurrence <= 1 {
        format!("{slug}{ext}")
    } else {
        format!("{slug}{occurrence}{ext}")
    }
}

/// Windows reserved device names that cannot be used as directory names
const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Directory name for a collection's output folder
///
/// Upper-cased, slugified, and prefixed with an underscore when the code
/// collides with a Windows reserved device name (the set code "CON" exists).
///
/// The executor takes whatever output directory it is given; callers that
/// lay out one folder per collection derive it with this helper, as the
/// crate-level quick start does.
pub fn collection_dir_name(code: &str) -> String {
    let code = if code.trim().is_empty() { "UNK" } else { code };
    let dir = slugify(&code.trim().to_ascii_uppercase());
    if WINDOWS_RESERVED.contains(&dir.as_str()) {
        format!("_{dir}")
    } else {
        dir
    }
}

/// Deterministic occurrence numbering for jobs sharing a naming key
///
/// The key is `(collection, slug(display name))`; the first job for a key is
/// occurrence 1, the next 2, and so on, in the order [`NameCounter::next`] is
/// called. Numbering is derived purely from iteration order — there is no
/// stable upstream identity pinning a number to a specific record, so an
/// upstream reorder or inserted printing shifts the numbers of everything
/// after it. Callers that need stable names across catalog changes must
/// rebuild the collection.
#[derive(Debug, Default)]
pub struct NameCounter {
    counts: HashMap<(String, String), u32>,
}

impl NameCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the occurrence index (1-based) for this display name and bump
    /// the counter
    pub fn next(&mut self, collection: &str, display_name: &str) -> u32 {
        let key = (collection.to_string(), slugify(display_name));
        let entry = self.counts.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_passes_plain_names_through() {
        assert_eq!(slugify("Lightning Bolt"), "Lightning Bolt");
    }

    #[test]
    fn slugify_replaces_colon_with_dash() {
        assert_eq!(slugify("Circle of Protection: Red"), "Circle of Protection- Red");
    }

    #[test]
    fn slugify_replaces_illegal_chars_with_underscore() {
        assert_eq!(slugify("Who/What/When/Where/Why"), "Who_What_When_Where_Why");
        assert_eq!(slugify("a<b>c\"d|e?f*g"), "a_b_c_d_e_f_g");
    }

    #[test]
    fn slugify_strips_control_chars() {
        assert_eq!(slugify("Bad\u{0}Name\u{1f}"), "Bad_Name_");
    }

    #[test]
    fn slugify_trims_trailing_dots_and_spaces() {
        assert_eq!(slugify("Trailing. "), "Trailing");
        assert_eq!(slugify("Dots..."), "Dots");
    }

    #[test]
    fn slugify_empty_falls_back_to_unknown() {
        assert_eq!(slugify(""), "Unknown");
        assert_eq!(slugify("   "), "Unknown");
        assert_eq!(slugify("..."), "Unknown");
    }

    #[test]
    fn infer_ext_detects_png() {
        assert_eq!(infer_ext("https://img.example/cards/png/front/a.png?v=1"), ".png");
        assert_eq!(infer_ext("https://img.example/cards/large/front/a.jpg"), ".jpg");
        assert_eq!(infer_ext(""), ".jpg");
    }

    #[test]
    fn target_filename_first_occurrence_has_no_suffix() {
        assert_eq!(target_filename("Bolt", 1, ".jpg"), "Bolt.jpg");
    }

    #[test]
    fn target_filename_later_occurrences_get_number() {
        assert_eq!(target_filename("Flip", 2, ".jpg"), "Flip2.jpg");
        assert_eq!(target_filename("Forest", 12, ".png"), "Forest12.png");
    }

    #[test]
    fn name_counter_numbers_per_key_in_order() {
        let mut counter = NameCounter::new();
        assert_eq!(counter.next("ABC", "Bolt"), 1);
        assert_eq!(counter.next("ABC", "Flip"), 1);
        assert_eq!(counter.next("ABC", "Flip"), 2);
        assert_eq!(counter.next("ABC", "Bolt"), 2);
        // Different collection, independent numbering
        assert_eq!(counter.next("XYZ", "Bolt"), 1);
    }

    #[test]
    fn name_counter_keys_on_slug_not_raw_name() {
        let mut counter = NameCounter::new();
        // Same slug after illegal-char replacement -> same key
        assert_eq!(counter.next("ABC", "Fire/Ice"), 1);
        assert_eq!(counter.next("ABC", "Fire_Ice"), 2);
    }

    #[test]
    fn collection_dir_name_uppercases() {
        assert_eq!(collection_dir_name("one"), "ONE");
        assert_eq!(collection_dir_name(" m21 "), "M21");
    }

    #[test]
    fn collection_dir_name_escapes_windows_reserved() {
        assert_eq!(collection_dir_name("con"), "_CON");
        assert_eq!(collection_dir_name("LPT1"), "_LPT1");
    }

    #[test]
    fn collection_dir_name_empty_falls_back() {
        assert_eq!(collection_dir_name(""), "UNK");
    }
}
