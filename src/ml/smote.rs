//! SMOTE: synthetic minority oversampling. New minority points are sampled on
//! the segment between a real minority point and one of its k nearest minority
//! neighbors, bringing the classes to parity.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FitError;

/// Oversample the minority class of `(x, y)` to match the majority count.
/// Returns the augmented matrix and labels; the input rows come first,
/// synthetic rows are appended. A perfectly balanced input is returned as-is.
pub fn oversample(
    x: &[Vec<f64>],
    y: &[u8],
    k_neighbors: usize,
    seed: u64,
) -> Result<(Vec<Vec<f64>>, Vec<u8>), FitError> {
    super::check_training_set(x, y)?;

    let positives = y.iter().filter(|&&label| label == 1).count();
    let negatives = y.len() - positives;
    if positives == negatives {
        return Ok((x.to_vec(), y.to_vec()));
    }
    let minority_label: u8 = if positives < negatives { 1 } else { 0 };
    let minority: Vec<usize> =
        (0..y.len()).filter(|&i| y[i] == minority_label).collect();
    if minority.len() < 2 {
        return Err(FitError::TooFewMinoritySamples(minority.len()));
    }

    let needed = positives.abs_diff(negatives);
    let k = k_neighbors.max(1).min(minority.len() - 1);

    // Neighbor lists within the minority set, computed once.
    let neighbors: Vec<Vec<usize>> = minority
        .iter()
        .map(|&i| {
            let mut others: Vec<(f64, usize)> = minority
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(&x[i], &x[j]), j))
                .collect();
            others.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            others.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out_x = x.to_vec();
    let mut out_y = y.to_vec();

    for _ in 0..needed {
        let pick = rng.gen_range(0..minority.len());
        let base = &x[minority[pick]];
        let neighbor = &x[neighbors[pick][rng.gen_range(0..neighbors[pick].len())]];
        let gap: f64 = rng.gen_range(0.0..1.0);
        let synthetic: Vec<f64> = base
            .iter()
            .zip(neighbor)
            .map(|(a, b)| a + gap * (b - a))
            .collect();
        out_x.push(synthetic);
        out_y.push(minority_label);
    }

    Ok((out_x, out_y))
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..12 {
            x.push(vec![i as f64, 0.0]);
            y.push(0);
        }
        x.push(vec![100.0, 1.0]);
        y.push(1);
        x.push(vec![101.0, 1.0]);
        y.push(1);
        x.push(vec![102.0, 1.0]);
        y.push(1);
        (x, y)
    }

    #[test]
    fn balances_the_classes() {
        let (x, y) = imbalanced();
        let (bx, by) = oversample(&x, &y, 5, 42).unwrap();
        let positives = by.iter().filter(|&&l| l == 1).count();
        assert_eq!(positives, by.len() - positives);
        assert_eq!(bx.len(), by.len());
        assert_eq!(bx.len(), 24);
    }

    #[test]
    fn synthetic_points_interpolate_minority_samples() {
        let (x, y) = imbalanced();
        let (bx, by) = oversample(&x, &y, 5, 42).unwrap();
        for (row, &label) in bx.iter().zip(&by).skip(x.len()) {
            assert_eq!(label, 1);
            assert!((100.0..=102.0).contains(&row[0]), "interpolated x = {}", row[0]);
            assert_eq!(row[1], 1.0);
        }
    }

    #[test]
    fn balanced_input_is_unchanged() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![0, 1];
        let (bx, by) = oversample(&x, &y, 5, 42).unwrap();
        assert_eq!(bx, x);
        assert_eq!(by, y);
    }

    #[test]
    fn single_minority_sample_is_an_error() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0]];
        let y = vec![0, 0, 1];
        assert_eq!(
            oversample(&x, &y, 5, 42).unwrap_err(),
            FitError::TooFewMinoritySamples(1)
        );
    }

    #[test]
    fn is_deterministic_for_a_fixed_seed() {
        let (x, y) = imbalanced();
        let a = oversample(&x, &y, 5, 99).unwrap();
        let b = oversample(&x, &y, 5, 99).unwrap();
        assert_eq!(a.0, b.0);
    }
}
