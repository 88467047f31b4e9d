// src/taxonomy/matcher.rs
//! Fuzzy resolution of free-text labels against a canonical label table.
//!
//! Filings rarely reproduce section titles verbatim: punctuation drifts,
//! "and" becomes "&", whole clauses get abbreviated. Resolution therefore
//! normalizes both sides and scores them with Levenshtein-based similarity,
//! returning the best available candidate. There is no minimum threshold;
//! callers that need confidence must judge the match themselves.

use crate::taxonomy::CanonicalLabel;
use crate::utils::text::normalize_for_match;

/// Resolves `free_text` to the best-matching candidate.
///
/// Returns `None` only for an empty candidate list. An exact normalized
/// match short-circuits; otherwise the highest-scoring candidate wins, with
/// ties broken by iteration order (first candidate encountered).
pub fn resolve<'a>(
    free_text: &str,
    candidates: &'a [CanonicalLabel],
) -> Option<&'a CanonicalLabel> {
    let needle = normalize_for_match(free_text);

    let mut best: Option<(&CanonicalLabel, f64)> = None;
    for candidate in candidates {
        let score = similarity(&needle, &normalize_for_match(candidate.description));
        if score == 1.0 {
            return Some(candidate);
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best.map(|(candidate, _)| candidate)
}

/// Similarity in `[0.0, 1.0]`: `1 - levenshtein(a, b) / max(len(a), len(b))`.
/// Two empty strings are identical (1.0); one empty side matches nothing.
pub fn similarity(source: &str, target: &str) -> f64 {
    if source.is_empty() {
        return if target.is_empty() { 1.0 } else { 0.0 };
    }
    if target.is_empty() {
        return 0.0;
    }

    let source_chars: Vec<char> = source.chars().collect();
    let target_chars: Vec<char> = target.chars().collect();
    let distance = levenshtein(&source_chars, &target_chars);
    let max_len = source_chars.len().max(target_chars.len());
    1.0 - distance as f64 / max_len as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let m = a.len();
    let n = b.len();
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }

    dp[m][n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::FORM_10K_SECTIONS;

    #[test]
    fn levenshtein_distance_basics() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars(""), &chars("")), 0);
        assert_eq!(levenshtein(&chars("abc"), &chars("abc")), 0);
        assert_eq!(levenshtein(&chars("abc"), &chars("")), 3);
        assert_eq!(levenshtein(&chars("abc"), &chars("abd")), 1);
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
    }

    #[test]
    fn similarity_is_symmetric() {
        let pairs = [
            ("risk factors", "risk factor"),
            ("business", "legal proceedings"),
            ("", "properties"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn empty_against_empty_is_identical() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "x"), 0.0);
    }

    #[test]
    fn resolves_own_description_exactly() {
        // Reflexivity: every candidate's own description must resolve back
        // to that candidate with similarity 1.0.
        for section in FORM_10K_SECTIONS {
            let resolved = resolve(section.description, FORM_10K_SECTIONS)
                .unwrap_or_else(|| panic!("no match for {}", section.code));
            assert_eq!(resolved.code, section.code);
        }
    }

    #[test]
    fn punctuation_and_case_do_not_matter() {
        let resolved = resolve("RISK FACTORS.", FORM_10K_SECTIONS).unwrap();
        assert_eq!(resolved.code, "Item1A");

        let resolved = resolve(
            "Management\u{2019}s Discussion and Analysis of Financial Condition and Results of Operations",
            FORM_10K_SECTIONS,
        )
        .unwrap();
        assert_eq!(resolved.code, "Item7");
    }

    #[test]
    fn near_miss_still_returns_best_candidate() {
        let resolved = resolve("Risk Factor", FORM_10K_SECTIONS).unwrap();
        assert_eq!(resolved.code, "Item1A");
    }

    #[test]
    fn no_candidates_returns_none() {
        assert!(resolve("anything", &[]).is_none());
    }

    #[test]
    fn ties_break_to_first_candidate() {
        use crate::taxonomy::CanonicalLabel;
        static TIED: &[CanonicalLabel] = &[
            CanonicalLabel {
                code: "A",
                description: "abcd",
                order: 1,
            },
            CanonicalLabel {
                code: "B",
                description: "abdc",
                order: 2,
            },
        ];
        // Equidistant from both candidates; the first must win.
        let resolved = resolve("abc", TIED).unwrap();
        assert_eq!(resolved.code, "A");
    }
}
