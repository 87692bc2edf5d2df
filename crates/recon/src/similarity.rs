//! Header-to-field similarity scoring.
//!
//! Scores live in `[0, 1]` and are tiered: whole-header keyword containment
//! beats an exact word match, which beats a word-level substring, which
//! beats the fuzzy character ratio. The tiers are what make mapping
//! deterministic across cosmetically different statement layouts.

/// Generic filler words that carry no signal on their own.
const STOP_WORDS: [&str; 5] = ["id", "number", "num", "no", "#"];

/// Lowercase, fold `_`/`-` to spaces, drop `$`, trim.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .replace(['_', '-'], " ")
        .replace('$', "")
        .trim()
        .to_string()
}

/// Score how well a header cell names one canonical field, given the
/// field's keyword list. Returns 0 for empty input.
pub fn similarity(header: &str, keywords: &[&str]) -> f64 {
    if header.trim().is_empty() || keywords.is_empty() {
        return 0.0;
    }
    let normalized = normalize_header(header);
    let words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect();

    let mut best: f64 = 0.0;
    for keyword in keywords {
        if normalized.contains(keyword) {
            best = best.max(1.0);
            continue;
        }
        for word in &words {
            if word == keyword {
                best = best.max(0.9);
                continue;
            }
            if keyword.contains(word) || word.contains(keyword) {
                best = best.max(0.8);
                continue;
            }
            // Fuzzy tier: character ratio plus a small bonus so longer
            // near-misses outrank short coincidental ones.
            let bonus = (word.len().min(keyword.len()) as f64 / 10.0) * 0.1;
            best = best.max(char_ratio(word, keyword) + bonus);
        }
    }
    best.min(1.0)
}

/// Character-level similarity `2 * M / (|a| + |b|)` where `M` counts
/// matched characters across matching blocks: longest common contiguous
/// run first, then recurse on what remains to either side.
fn char_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / (a.len() + b.len()) as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Longest common contiguous run, earliest position on ties.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0usize, 0usize, 0usize);
    let mut row = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        let mut prev_diag = 0;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] { prev_diag + 1 } else { 0 };
            prev_diag = tmp;
            if row[j] > best.2 {
                best = (i - row[j], j - row[j], row[j]);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_header("Member_ID"), "member id");
        assert_eq!(normalize_header("  Paid-Amount $ "), "paid amount");
    }

    #[test]
    fn containment_scores_full() {
        assert_eq!(similarity("Paid Amount", &["paid amount"]), 1.0);
        assert_eq!(similarity("Member ID", &["member"]), 1.0);
        assert_eq!(similarity("Payout Amt", &["payout"]), 1.0);
    }

    #[test]
    fn word_inside_keyword_scores_substring_tier() {
        assert_eq!(similarity("Pay", &["payout"]), 0.8);
    }

    #[test]
    fn fuzzy_tier_ranks_below_containment() {
        let fuzzy = similarity("Txn ID", &["transaction", "trans"]);
        assert!(fuzzy > 0.3 && fuzzy < 0.9, "got {fuzzy}");
        assert!(similarity("Transaction ID", &["transaction", "trans"]) > fuzzy);
    }

    #[test]
    fn stop_words_alone_score_nothing() {
        assert_eq!(similarity("ID", &["policy"]), 0.0);
        assert_eq!(similarity("Number", &["member"]), 0.0);
    }

    #[test]
    fn unrelated_headers_stay_below_threshold() {
        assert!(similarity("NPN", &["effective", "start", "begin"]) <= 0.3);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(similarity("", &["member"]), 0.0);
        assert_eq!(similarity("Member", &[]), 0.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let a = similarity("Contract ID", &["plan", "product", "scheme"]);
        let b = similarity("Contract ID", &["plan", "product", "scheme"]);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn score_is_bounded(header in ".{0,40}") {
            let s = similarity(&header, &["member", "policy", "subscriber"]);
            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
