use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Stable bucket choice for a string, independent of process or platform
/// randomness within one std version. Used to pick verse variants
/// deterministically per topic.
pub fn stable_index(text: &str, buckets: usize) -> usize {
    if buckets == 0 {
        return 0;
    }

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    (hasher.finish() % buckets as u64) as usize
}

/// Collapses multi-line output for in-node display: over the line budget it
/// keeps the first and last line, or clips a single allowed line.
pub fn output_snippet(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let max_lines = max_lines.max(1);

    if lines.len() <= max_lines {
        return text.to_owned();
    }
    if max_lines == 1 {
        let first = lines.first().copied().unwrap_or_default();
        let clipped: String = first.chars().take(20).collect();
        return format!("{clipped}...");
    }
    format!(
        "{}\n...\n{}",
        lines.first().copied().unwrap_or_default(),
        lines.last().copied().unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_index_is_stable_and_bounded() {
        let first = stable_index("cake", 2);
        assert_eq!(first, stable_index("cake", 2));
        assert!(first < 2);
        assert_eq!(stable_index("anything", 0), 0);
    }

    #[test]
    fn snippet_keeps_short_text_untouched() {
        assert_eq!(output_snippet("one\ntwo", 3), "one\ntwo");
    }

    #[test]
    fn snippet_collapses_long_text_to_ends() {
        let text = "first\nsecond\nthird\nfourth";
        assert_eq!(output_snippet(text, 2), "first\n...\nfourth");
    }

    #[test]
    fn snippet_clips_single_line_budget() {
        let text = "a very long first line that keeps going\nmore";
        assert_eq!(output_snippet(text, 1), "a very long first li...");
    }
}
