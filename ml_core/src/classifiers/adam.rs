use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use crate::Learner;

const ALPHA: f64 = 0.001;
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// Adam over the hinge loss, with the moment parameters of the original paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    steps: i32,
    first: Array1<f64>,
    second: Array1<f64>,
    weights: Array1<f64>,
}

impl Adam {
    pub fn new(dim: usize) -> Self {
        Self {
            steps: 0,
            first: Array1::zeros(dim),
            second: Array1::zeros(dim),
            weights: Array1::zeros(dim),
        }
    }
}

impl Learner for Adam {
    fn dim(&self) -> usize {
        self.weights.len()
    }

    fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    fn learn(&mut self, x: ArrayView1<'_, f64>, y: f64) {
        if y * self.weights.dot(&x) >= 1.0 {
            return;
        }

        self.steps = self.steps.saturating_add(1);
        let bias1 = 1.0 - BETA1.powi(self.steps);
        let bias2 = 1.0 - BETA2.powi(self.steps);

        Zip::from(&mut self.weights)
            .and(&mut self.first)
            .and(&mut self.second)
            .and(&x)
            .for_each(|w, m, v, &xi| {
                let g = -y * xi;
                *m = BETA1 * *m + (1.0 - BETA1) * g;
                *v = BETA2 * *v + (1.0 - BETA2) * g * g;
                *w -= ALPHA * (*m / bias1) / ((*v / bias2).sqrt() + EPSILON);
            });
    }
}
