//! Gestalt (Ratcliff/Obershelp) string similarity used for typo suggestions
//!
//! Copyright (c) 2025 RRMS Authors
//! Licensed under the Apache-2.0 license

/// Similarity of two strings on a 0.0..=1.0 scale, computed as `2*M / T`
/// where `M` is the number of characters in matching blocks and `T` the
/// combined length.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Pick the single best candidate whose similarity to `word` is at least `cutoff`.
///
/// Ties on score go to the lexicographically greater candidate so the
/// suggestion is stable regardless of candidate order.
pub fn closest_match<'a, I>(word: &str, candidates: I, cutoff: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(f64, &'a str)> = None;
    for candidate in candidates {
        let score = ratio(word, candidate);
        if score < cutoff {
            continue;
        }
        best = match best {
            Some((best_score, best_candidate))
                if best_score > score || (best_score == score && best_candidate >= candidate) =>
            {
                Some((best_score, best_candidate))
            }
            _ => Some((score, candidate)),
        };
    }
    best.map(|(_, candidate)| candidate)
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            queue.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`, earliest in `a`
/// first, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    let mut prev = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                current[j - blo + 1] = k;
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        prev = current;
    }

    (best_i, best_j, best_size)
}
