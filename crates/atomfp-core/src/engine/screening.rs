use crate::engine::config::{CorrelationKind, ScreeningMethod};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// The accepted/rejected column partition produced by a screen.
///
/// `accepted` and `rejected` are disjoint, each sorted ascending, and
/// together cover every column index of the screened matrix exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenPartition {
    pub accepted: Vec<usize>,
    pub rejected: Vec<usize>,
}

impl ScreenPartition {
    /// Builds a partition keeping the `size` highest-|score| columns, ties
    /// broken by ascending index for determinism.
    fn from_scores(scores: &[f64], size: usize) -> Self {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .abs()
                .partial_cmp(&scores[a].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut accepted: Vec<usize> = order.into_iter().take(size).collect();
        accepted.sort_unstable();
        let rejected = complement(&accepted, scores.len());
        Self { accepted, rejected }
    }
}

fn complement(accepted: &[usize], total: usize) -> Vec<usize> {
    let mut in_accepted = vec![false; total];
    for &i in accepted {
        in_accepted[i] = true;
    }
    (0..total).filter(|&i| !in_accepted[i]).collect()
}

/// Pearson product-moment correlation.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx) * (a - mx);
        vy += (b - my) * (b - my);
    }
    let denom = (vx * vy).sqrt();
    if denom > 0.0 { cov / denom } else { 0.0 }
}

/// Spearman rank correlation: Pearson on mid-ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&ranks(x), &ranks(y))
}

/// Kendall tau-a: concordant minus discordant pairs over all pairs.
pub fn kendall(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    let mut score = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let sx = (x[i] - x[j]).signum();
            let sy = (y[i] - y[j]).signum();
            score += (sx * sy) as i64;
        }
    }
    score as f64 / (n * (n - 1) / 2) as f64
}

pub fn correlation(kind: CorrelationKind, x: &[f64], y: &[f64]) -> f64 {
    match kind {
        CorrelationKind::Pearson => pearson(x, y),
        CorrelationKind::Spearman => spearman(x, y),
        CorrelationKind::Kendall => kendall(x, y),
    }
}

/// Mid-ranks (average over ties), 1-based.
fn ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            out[idx] = rank;
        }
        i = j + 1;
    }
    out
}

/// Sure independence screening: keeps the `size` columns with the largest
/// absolute linear correlation against the target.
pub fn sure_independence(train: &DMatrix<f64>, target: &DVector<f64>, size: usize) -> ScreenPartition {
    screen_against(train, target.as_slice(), size, CorrelationKind::Pearson)
}

/// Rank-correlation screening with a configurable correlation statistic.
pub fn rank_correlation(
    train: &DMatrix<f64>,
    target: &DVector<f64>,
    size: usize,
    corr: CorrelationKind,
) -> ScreenPartition {
    screen_against(train, target.as_slice(), size, corr)
}

fn screen_against(
    train: &DMatrix<f64>,
    target: &[f64],
    size: usize,
    corr: CorrelationKind,
) -> ScreenPartition {
    let scores: Vec<f64> = (0..train.ncols())
        .map(|j| {
            let col: Vec<f64> = train.column(j).iter().copied().collect();
            correlation(corr, &col, target)
        })
        .collect();
    ScreenPartition::from_scores(&scores, size)
}

/// Iterative small-batch screening for very wide matrices.
///
/// Accepts up to `step` columns per round against the current residual,
/// refits a least-squares model on everything accepted so far, and screens
/// the remainder against the new residual until `size` columns are held.
pub fn iterative(
    train: &DMatrix<f64>,
    target: &DVector<f64>,
    size: usize,
    step: usize,
    method: ScreeningMethod,
    corr: CorrelationKind,
) -> ScreenPartition {
    let d = train.ncols();
    let step = step.max(1);
    let corr = match method {
        ScreeningMethod::RankCorrelation => corr,
        ScreeningMethod::SureIndependence => CorrelationKind::Pearson,
    };

    let mut accepted: Vec<usize> = Vec::new();
    let mut residual = target.clone();

    while accepted.len() < size.min(d) {
        let remaining: Vec<usize> = (0..d).filter(|i| !accepted.contains(i)).collect();
        if remaining.is_empty() {
            break;
        }

        let mut scored: Vec<(usize, f64)> = remaining
            .iter()
            .map(|&j| {
                let col: Vec<f64> = train.column(j).iter().copied().collect();
                (j, correlation(corr, &col, residual.as_slice()).abs())
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let take = step.min(size - accepted.len());
        accepted.extend(scored.iter().take(take).map(|&(j, _)| j));
        debug!(accepted = accepted.len(), "iterative screening round");

        // Regress the target on everything accepted so far; later rounds
        // screen against what the current selection cannot explain.
        let sub = train.select_columns(accepted.iter());
        if let Ok(coef) = sub.clone().svd(true, true).solve(target, 1e-12) {
            residual = target - sub * coef;
        }
    }

    accepted.sort_unstable();
    let rejected = complement(&accepted, d);
    ScreenPartition { accepted, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_matrix() -> (DMatrix<f64>, DVector<f64>) {
        // Five columns; column 0 equals the target, column 2 is its negation,
        // columns 1/3/4 are weakly related or constant-ish noise.
        let target = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let train = DMatrix::from_fn(6, 5, |i, j| match j {
            0 => target[i],
            1 => (i as f64 * 7.3).sin(),
            2 => -target[i],
            3 => (i as f64 * 3.1).cos(),
            4 => target[i] * target[i],
            _ => unreachable!(),
        });
        (train, target)
    }

    #[test]
    fn partition_covers_all_indices_exactly_once() {
        let (train, target) = toy_matrix();
        for size in [0, 1, 3, 5, 10] {
            let p = sure_independence(&train, &target, size);
            assert!(p.accepted.len() <= size);
            let mut all: Vec<usize> = p.accepted.iter().chain(&p.rejected).copied().collect();
            all.sort_unstable();
            assert_eq!(all, (0..5).collect::<Vec<_>>());
        }
    }

    #[test]
    fn sure_independence_keeps_strongest_linear_columns() {
        let (train, target) = toy_matrix();
        let p = sure_independence(&train, &target, 2);
        assert!(p.accepted.contains(&0));
        assert!(p.accepted.contains(&2));
    }

    #[test]
    fn rank_correlation_agrees_on_monotone_columns() {
        let (train, target) = toy_matrix();
        for corr in [
            CorrelationKind::Pearson,
            CorrelationKind::Spearman,
            CorrelationKind::Kendall,
        ] {
            let p = rank_correlation(&train, &target, 3, corr);
            // Columns 0, 2, 4 are all perfectly monotone in the target.
            assert_eq!(p.accepted, vec![0, 2, 4]);
        }
    }

    #[test]
    fn kendall_matches_hand_computed_value() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 2.0];
        // Pairs: (1,2) concordant, (1,3) concordant, (2,3) discordant.
        assert!((kendall(&x, &y) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn spearman_is_one_for_monotone_nonlinear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 8.0, 27.0, 64.0];
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);
        assert!(pearson(&x, &y) < 1.0);
    }

    #[test]
    fn iterative_screening_respects_size_cap() {
        let (train, target) = toy_matrix();
        let p = iterative(
            &train,
            &target,
            3,
            1,
            ScreeningMethod::RankCorrelation,
            CorrelationKind::Pearson,
        );
        assert_eq!(p.accepted.len(), 3);
        let mut all: Vec<usize> = p.accepted.iter().chain(&p.rejected).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..5).collect::<Vec<_>>());
    }

    #[test]
    fn iterative_screening_finds_complementary_columns() {
        // Target is the sum of two orthogonal-ish columns; after accepting the
        // first, the residual points at the second even though its marginal
        // correlation is weaker.
        let c0 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let c1 = [0.5, -0.5, 0.5, -0.5, 0.5, -0.5];
        let noise = [0.1, 0.0, -0.1, 0.0, 0.1, 0.0];
        let target = DVector::from_fn(6, |i, _| c0[i] + 2.0 * c1[i]);
        let train = DMatrix::from_fn(6, 3, |i, j| match j {
            0 => c0[i],
            1 => noise[i],
            2 => c1[i],
            _ => unreachable!(),
        });

        let p = iterative(
            &train,
            &target,
            2,
            1,
            ScreeningMethod::SureIndependence,
            CorrelationKind::Pearson,
        );
        assert_eq!(p.accepted, vec![0, 2]);
    }
}
