//! k-nearest-neighbour majority vote over decoded distances.

use crate::error::{err, Result};

/// Label with the most occurrences among the `k` nearest candidates.
///
/// Candidates are ranked by a stable ascending sort, so equal distances keep
/// their input order. Equally frequent labels are resolved in favour of the
/// one that appears first in the ranked top-k. A `k` above the candidate
/// count uses every candidate.
pub fn classify(distances: &[f64], labels: &[String], k: usize) -> Result<String> {
    if distances.len() != labels.len() {
        return Err(err!(
            Protocol,
            "{} distances but {} labels",
            distances.len(),
            labels.len()
        ));
    }
    if k == 0 {
        return Err(err!(Configuration, "k must be at least 1"));
    }
    if distances.is_empty() {
        return Err(err!(Configuration, "no candidates to classify"));
    }

    let mut ranked: Vec<(f64, &str)> = distances
        .iter()
        .copied()
        .zip(labels.iter().map(String::as_str))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &(_, label) in ranked.iter().take(k) {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    // counts is in first-occurrence order; only a strictly larger count wins
    let mut best = counts[0];
    for &candidate in &counts[1..] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    Ok(best.0.to_string())
}

/// [`classify`] applied to each query's distances.
pub fn classify_all(
    distances: &[Vec<f64>],
    labels: &[Vec<String>],
    k: usize,
) -> Result<Vec<String>> {
    if distances.len() != labels.len() {
        return Err(err!(
            Protocol,
            "{} distance lists but {} label lists",
            distances.len(),
            labels.len()
        ));
    }
    distances
        .iter()
        .zip(labels)
        .map(|(d, l)| classify(d, l, k))
        .collect()
}
