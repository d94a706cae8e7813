//! Matching utilities for centroid tracking.

use ndarray::Array2;

use crate::tracker::rect::Centroid;
use crate::tracker::TrackerError;

/// Compute the Euclidean distance matrix between tracked centroids (rows)
/// and input centroids (columns).
pub fn distance_matrix(tracked: &[Centroid], inputs: &[Centroid]) -> Array2<f64> {
    let mut dists = Array2::zeros((tracked.len(), inputs.len()));
    for (i, t) in tracked.iter().enumerate() {
        for (j, c) in inputs.iter().enumerate() {
            dists[[i, j]] = t.distance(c);
        }
    }
    dists
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy nearest-neighbour assignment.
///
/// Rows are visited in ascending order of their smallest distance (stable, so
/// ties keep row order). Each visited row proposes its arg-min column and the
/// pair is accepted only if neither side has been used. A row whose best
/// column was already taken stays unmatched; it does not fall back to its
/// second-best column.
pub fn greedy_assignment(
    cost_matrix: &Array2<f64>,
    num_tracks: usize,
    num_detections: usize,
) -> Result<AssignmentResult, TrackerError> {
    let (num_rows, num_cols) = cost_matrix.dim();
    if (num_rows, num_cols) != (num_tracks, num_detections) {
        return Err(TrackerError::DistanceMatrixShape {
            expected: (num_tracks, num_detections),
            got: (num_rows, num_cols),
        });
    }

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        });
    }

    // (row minimum, arg-min column) per row; the first minimum wins on ties
    let best: Vec<(f64, usize)> = cost_matrix
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((f64::INFINITY, 0), |acc, (j, &d)| if d < acc.0 { (d, j) } else { acc })
        })
        .collect();

    let mut order: Vec<usize> = (0..num_rows).collect();
    order.sort_by(|&a, &b| best[a].0.total_cmp(&best[b].0));

    let mut used_rows = vec![false; num_rows];
    let mut used_cols = vec![false; num_cols];
    let mut matches = vec![];

    for row in order {
        let col = best[row].1;
        if used_rows[row] || used_cols[col] {
            continue;
        }
        used_rows[row] = true;
        used_cols[col] = true;
        matches.push((row, col));
    }

    let unmatched_tracks = (0..num_rows).filter(|&i| !used_rows[i]).collect();
    let unmatched_detections = (0..num_cols).filter(|&j| !used_cols[j]).collect();

    Ok(AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Centroid {
        Centroid::new(x, y)
    }

    #[test]
    fn test_distance_matrix_shape() {
        let dists = distance_matrix(&[c(0, 0), c(3, 4)], &[c(0, 0), c(6, 8), c(3, 0)]);
        assert_eq!(dists.dim(), (2, 3));
        assert_eq!(dists[[0, 0]], 0.0);
        assert_eq!(dists[[1, 0]], 5.0);
        assert_eq!(dists[[0, 1]], 10.0);
    }

    #[test]
    fn test_greedy_matches_nearest() {
        let tracked = [c(0, 0), c(100, 100)];
        let inputs = [c(98, 98), c(2, 2), c(300, 300)];
        let dists = distance_matrix(&tracked, &inputs);
        let result = greedy_assignment(&dists, 2, 3).unwrap();

        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![2]);
    }

    #[test]
    fn test_greedy_contested_column_leaves_row_unmatched() {
        // Both rows prefer column 0; row 1 is closer so it wins and row 0 is
        // left without a match even though column 1 is free.
        let tracked = [c(0, 0), c(10, 0)];
        let inputs = [c(9, 0), c(50, 0)];
        let dists = distance_matrix(&tracked, &inputs);
        let result = greedy_assignment(&dists, 2, 2).unwrap();

        assert_eq!(result.matches, vec![(1, 0)]);
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_greedy_ties_follow_row_order() {
        let tracked = [c(0, 0), c(0, 10)];
        let inputs = [c(0, 5)];
        let dists = distance_matrix(&tracked, &inputs);
        let result = greedy_assignment(&dists, 2, 1).unwrap();

        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let dists = distance_matrix(&[c(0, 0)], &[c(1, 1)]);
        let err = greedy_assignment(&dists, 2, 1).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::DistanceMatrixShape {
                expected: (2, 1),
                got: (1, 1)
            }
        ));
    }
}
