//! Content complexity heuristic used by preference filtering.
//!
//! Length contributes up to 0.4 for any item; code items add up to 0.6
//! more from control-structure density, function-definition count, and
//! brace nesting depth.

use crate::items::{Item, ItemKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Content length at which the length contribution saturates.
const LENGTH_SATURATION: f32 = 5000.0;

static CONTROL_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|else|for|while|switch|match|loop|case|try|catch)\b")
        .expect("Failed to compile control keyword regex")
});

static FUNCTION_DEFS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(fn|def|function|func)\b|=>").expect("Failed to compile function regex")
});

/// Complexity in [0.0, 1.0].
pub fn complexity(item: &Item) -> f32 {
    let mut score = (item.content.len() as f32 / LENGTH_SATURATION).min(0.4);
    if item.kind == ItemKind::Code {
        score += 0.6 * code_complexity(&item.content);
    }
    score
}

/// Code-specific complexity in [0.0, 1.0]: capped contributions from
/// control keywords, function definitions, and nesting depth.
fn code_complexity(content: &str) -> f32 {
    let control = CONTROL_KEYWORDS.find_iter(content).count() as f32;
    let functions = FUNCTION_DEFS.find_iter(content).count() as f32;
    let nesting = max_brace_depth(content) as f32;

    let control_part = (control / 20.0).min(0.4);
    let function_part = (functions / 10.0).min(0.3);
    let nesting_part = (nesting / 8.0).min(0.3);
    control_part + function_part + nesting_part
}

fn max_brace_depth(content: &str) -> usize {
    let mut depth: usize = 0;
    let mut max_depth = 0;
    for c in content.chars() {
        match c {
            '{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_plain_text_is_simple() {
        let item = Item::new("1", ItemKind::PlainText, "Note", "a short note");
        assert!(complexity(&item) < 0.5);
    }

    #[test]
    fn test_length_contribution_is_capped() {
        let item = Item::new("1", ItemKind::PlainText, "Long", "x".repeat(50_000));
        assert!((complexity(&item) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_dense_code_is_complex() {
        let body = r#"
            fn outer() {
                if a { for x in xs { if b { while c { match d { _ => {} } } } } }
                if e { } else { for y in ys { if f { } } }
            }
            fn second() { if g { loop { if h { } } } }
            fn third() { match i { _ => {} } }
        "#;
        let item = Item::new("1", ItemKind::Code, "Dense", body.repeat(3));
        assert!(complexity(&item) > 0.6, "got {}", complexity(&item));
    }

    #[test]
    fn test_code_keywords_ignored_for_plain_text() {
        let body = "if for while match loop".repeat(10);
        let code = Item::new("1", ItemKind::Code, "c", body.clone());
        let text = Item::new("2", ItemKind::PlainText, "t", body);
        assert!(complexity(&code) > complexity(&text));
    }

    #[test]
    fn test_brace_depth() {
        assert_eq!(max_brace_depth("{ { { } } }"), 3);
        assert_eq!(max_brace_depth("no braces"), 0);
        // unbalanced closers never underflow
        assert_eq!(max_brace_depth("} } {"), 1);
    }
}
