//! Longest common subsequence over rule identities
//!
//! The aligner only sees identities, never rule content. Classic dynamic
//! programming over suffix-match lengths, O(|old|·|new|) time and space,
//! which is fine for chains up to a few thousand entries.

/// Returns the longest sequence of elements appearing, in order, in both
/// `old` and `new`.
///
/// Multiple maximal subsequences can exist; reconstruction walks from the
/// front and, when both directions preserve the remaining score, advances
/// `old` first. The tie-break is pinned because it decides which physical
/// rules count as "unchanged" versus "replaced" downstream.
pub fn lcs<T: PartialEq + Clone>(old: &[T], new: &[T]) -> Vec<T> {
    let old_len = old.len();
    let new_len = new.len();
    // dp[i][j] = LCS length of old[i..] and new[j..]
    let mut dp = vec![vec![0usize; new_len + 1]; old_len + 1];

    for i in (0..old_len).rev() {
        for j in (0..new_len).rev() {
            let mut best = dp[i + 1][j].max(dp[i][j + 1]);
            if old[i] == new[j] {
                best = best.max(dp[i + 1][j + 1] + 1);
            }
            dp[i][j] = best;
        }
    }

    let mut common = Vec::with_capacity(dp[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < old_len && j < new_len {
        if old[i] == new[j] {
            common.push(old[i].clone());
            i += 1;
            j += 1;
        } else if dp[i][j] == dp[i + 1][j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    common
}
