//! Pure scoring utilities shared by both evaluator backends.

use std::collections::HashSet;

/// Jaccard similarity over distinct keyword tokens of two texts, rounded
/// to 3 decimals. Tokens are lowercase runs of `[a-z0-9_+#.]` longer than
/// one character (so "c++", "c#", and "node.js" survive tokenization).
/// Returns 0.0 if either token set is empty.
pub fn keyword_overlap_score(text: &str, reference: &str) -> f64 {
    let t1 = tokenize(text);
    let t2 = tokenize(reference);
    if t1.is_empty() || t2.is_empty() {
        return 0.0;
    }
    let inter = t1.intersection(&t2).count();
    let union = t1.union(&t2).count();
    round_to(inter as f64 / union as f64, 3)
}

/// Linearly rescales `val` from `[lo, hi]` onto `[1, scale]`, clamping the
/// normalized ratio to `[0, 1]` first. Rounded to 2 decimals. Returns 0.0
/// for a degenerate range (`hi <= lo`).
pub fn bounded_to_scale(val: f64, lo: f64, hi: f64, scale: u32) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    let r = ((val - lo) / (hi - lo)).clamp(0.0, 1.0);
    round_to(1.0 + r * (scale as f64 - 1.0), 2)
}

/// Rounds half-away-from-zero to `decimals` places.
pub fn round_to(val: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (val * factor).round() / factor
}

fn tokenize(s: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    for c in s.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '.') {
            current.push(c);
        } else if !current.is_empty() {
            if current.chars().count() > 1 {
                tokens.insert(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.chars().count() > 1 {
        tokens.insert(current);
    }
    tokens
}
