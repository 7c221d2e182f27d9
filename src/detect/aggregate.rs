//! Mode selection over repeated trials.

/// Most frequent value in `results`.
///
/// Ties go to the value whose first occurrence comes earliest. Returns
/// `None` for an empty slice.
pub fn mode<T: PartialEq + Clone>(results: &[T]) -> Option<T> {
    let mut best: Option<(&T, usize)> = None;

    for (i, candidate) in results.iter().enumerate() {
        // Later duplicates can only tie with their own first occurrence.
        if results[..i].contains(candidate) {
            continue;
        }
        let count = results[i..].iter().filter(|r| *r == candidate).count();
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((candidate, count));
        }
    }

    best.map(|(value, _)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority() {
        assert_eq!(mode(&[64, 64, 128, 64, 256]), Some(64));
    }

    #[test]
    fn test_tie_prefers_first_seen() {
        assert_eq!(mode(&[128, 64, 64, 128]), Some(128));
        assert_eq!(mode(&[32, 16, 8]), Some(32));
    }

    #[test]
    fn test_late_majority_wins() {
        assert_eq!(mode(&[8, 512, 512, 512, 8]), Some(512));
    }

    #[test]
    fn test_empty() {
        assert_eq!(mode::<usize>(&[]), None);
    }
}
