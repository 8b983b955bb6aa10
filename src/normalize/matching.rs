/// Closest candidate found by [`best_match`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub candidate: &'a str,
    pub score: f64,
}

/// Edit-distance ratio in `[0, 1]`: `1 - levenshtein / max(len)`, counted in chars.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Pick the single most similar candidate scoring at least `threshold`.
///
/// Ties on score go to the lexicographically smallest candidate, independent
/// of iteration order.
pub fn best_match<'a, I>(value: &str, candidates: I, threshold: f64) -> Option<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<Match<'a>> = None;

    for candidate in candidates {
        let score = similarity(value, candidate);
        if score < threshold {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                score > current.score || (score == current.score && candidate < current.candidate)
            }
        };
        if better {
            best = Some(Match { candidate, score });
        }
    }

    best
}
