//! Agglomerative clustering used to order heatmap axes.

/// Complete-linkage clustering on Euclidean distance, returning the leaf
/// order of the full dendrogram.
///
/// Merges always fold the later cluster into the earlier one and, among
/// equally distant pairs, the pair encountered first in input order wins.
/// The returned order is therefore a pure function of the input.
pub fn complete_linkage_order(points: &[Vec<f64>]) -> Vec<usize> {
    let n = points.len();
    if n <= 2 {
        return (0..n).collect();
    }

    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&points[i], &points[j]);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    // members[i] holds the leaves of the cluster rooted at slot i, in leaf order.
    let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
    let mut active: Vec<usize> = (0..n).collect();

    while active.len() > 1 {
        let mut best_dist = f64::INFINITY;
        let mut best_a = active[0];
        let mut best_b = active[1];
        for (ai, &a) in active.iter().enumerate() {
            for &b in &active[ai + 1..] {
                if dist[a][b] < best_dist {
                    best_dist = dist[a][b];
                    best_a = a;
                    best_b = b;
                }
            }
        }

        for &c in &active {
            if c == best_a || c == best_b {
                continue;
            }
            let merged = dist[best_a][c].max(dist[best_b][c]);
            dist[best_a][c] = merged;
            dist[c][best_a] = merged;
        }

        let absorbed = members[best_b].take().unwrap_or_default();
        if let Some(kept) = members[best_a].as_mut() {
            kept.extend(absorbed);
        }
        active.retain(|&c| c != best_b);
    }

    members[active[0]].take().unwrap_or_default()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
