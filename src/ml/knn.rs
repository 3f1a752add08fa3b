//! K-nearest-neighbors classifier. The fitted model is the training matrix
//! itself; the probability estimate is the positive fraction of the k nearest
//! points by Euclidean distance.

use serde::{Deserialize, Serialize};

use super::{check_training_set, BinaryClassifier, FitError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnParams {
    pub k: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    k: usize,
    points: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl KnnClassifier {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &KnnParams) -> Result<Self, FitError> {
        check_training_set(x, y)?;
        // Never ask for more neighbors than there are training points.
        let k = params.k.max(1).min(x.len());
        Ok(Self { k, points: x.to_vec(), labels: y.to_vec() })
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl BinaryClassifier for KnnClassifier {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut neighbors: Vec<(f64, u8)> = self
            .points
            .iter()
            .zip(&self.labels)
            .map(|(point, &label)| (squared_distance(point, features), label))
            .collect();
        neighbors
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let positives = neighbors
            .iter()
            .take(self.k)
            .filter(|(_, label)| *label == 1)
            .count();
        positives as f64 / self.k as f64
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clusters() -> (Vec<Vec<f64>>, Vec<u8>) {
        let x = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
        ];
        let y = vec![0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn votes_with_the_nearest_cluster() {
        let (x, y) = two_clusters();
        let model = KnnClassifier::fit(&x, &y, &KnnParams { k: 3 }).unwrap();
        assert_eq!(model.predict(&[0.05, 0.05]), 0);
        assert_eq!(model.predict(&[5.05, 5.05]), 1);
    }

    #[test]
    fn proba_is_the_neighbor_fraction() {
        let (x, y) = two_clusters();
        let model = KnnClassifier::fit(&x, &y, &KnnParams { k: 3 }).unwrap();
        assert_eq!(model.predict_proba(&[0.05, 0.05]), 0.0);
        assert_eq!(model.predict_proba(&[5.05, 5.05]), 1.0);
        // Halfway between the clusters, with k covering both sides.
        let wide = KnnClassifier::fit(&x, &y, &KnnParams { k: 6 }).unwrap();
        assert!((wide.predict_proba(&[2.5, 2.5]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn k_is_clamped_to_the_training_size() {
        let model =
            KnnClassifier::fit(&[vec![0.0], vec![1.0]], &[0, 1], &KnnParams { k: 10 }).unwrap();
        assert_eq!(model.k(), 2);
    }
}
