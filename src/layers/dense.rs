use crate::{activation::activation::Activation, math::matrix::Matrix};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One affine transform plus an activation.
///
/// The engine uses the column-vector convention throughout: a sample is an
/// `in x 1` column, weights are `out x in`, biases are `out x 1`, and the
/// forward pass is `activation(W * x + b)`. A batch is an `in x k` matrix
/// whose columns are samples.
///
/// Layers hold no forward-pass caches; the backprop routine keeps its own,
/// so a layer can be read concurrently by several worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Matrix,
    pub biases: Matrix,
    pub activation: Activation,
}

impl Layer {
    /// Builds a layer from explicit parameters. The bias must be a column
    /// matching the weight output width; anything else is a construction bug.
    pub fn new(weights: Matrix, biases: Matrix, activation: Activation) -> Layer {
        if biases.cols != 1 || biases.rows != weights.rows {
            panic!(
                "Invalid layer initialization with weights of size ({} {}) and biases of size ({} {})",
                weights.rows, weights.cols, biases.rows, biases.cols
            );
        }
        Layer {
            weights,
            biases,
            activation,
        }
    }

    /// Xavier-bounded random initialization: weights uniform in
    /// `[-eps, eps]` with `eps = sqrt(6 / (in + out))`, biases uniform in
    /// `[-1, 1]`.
    pub fn random<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Layer {
        let eps = (6.0 / (input_size + output_size) as f64).sqrt();

        let mut weights = Matrix::zeros(output_size, input_size);
        for idx in 0..output_size * input_size {
            weights.set_element_at(idx, rng.gen_range(-eps..eps));
        }

        let mut biases = Matrix::zeros(output_size, 1);
        for idx in 0..output_size {
            biases.set_element_at(idx, rng.gen_range(-1.0..1.0));
        }

        Layer::new(weights, biases, activation)
    }

    pub fn in_size(&self) -> usize {
        self.weights.cols
    }

    pub fn out_size(&self) -> usize {
        self.weights.rows
    }

    /// The pre-activation value `z = W * input + b`, with the bias broadcast
    /// across every column of a batch.
    pub fn affine(&self, input: &Matrix) -> Matrix {
        (&self.weights * input).add_broadcast(&self.biases)
    }

    pub fn feed_forward(&self, input: &Matrix) -> Matrix {
        self.affine(input).map(|x| self.activation.function(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_layer_has_the_requested_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Layer::random(3, 5, Activation::Sigmoid, &mut rng);
        assert_eq!(layer.in_size(), 3);
        assert_eq!(layer.out_size(), 5);
        assert_eq!(layer.weights.rows, 5);
        assert_eq!(layer.weights.cols, 3);
        assert_eq!(layer.biases.rows, 5);
        assert_eq!(layer.biases.cols, 1);
    }

    #[test]
    fn random_weights_respect_the_xavier_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Layer::random(4, 4, Activation::ReLU, &mut rng);
        let eps = (6.0 / 8.0_f64).sqrt();
        assert!(layer.weights.as_slice().iter().all(|w| w.abs() <= eps));
        assert!(layer.biases.as_slice().iter().all(|b| b.abs() <= 1.0));
    }

    #[test]
    fn feed_forward_applies_affine_then_activation() {
        // W = [[1, 2], [3, 4]], b = [1, -1], identity activation
        let weights = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let biases = Matrix::from_vec(2, 1, vec![1.0, -1.0]);
        let layer = Layer::new(weights, biases, Activation::Identity);

        let input = Matrix::from_vec(2, 1, vec![1.0, 1.0]);
        let out = layer.feed_forward(&input);
        assert_eq!(out.as_slice(), &[4.0, 6.0]);
    }

    #[test]
    fn feed_forward_broadcasts_bias_over_a_batch() {
        let weights = Matrix::from_vec(1, 2, vec![1.0, 1.0]);
        let biases = Matrix::from_vec(1, 1, vec![10.0]);
        let layer = Layer::new(weights, biases, Activation::Identity);

        let batch = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        let out = layer.feed_forward(&batch);
        assert_eq!(out.as_slice(), &[11.0, 12.0, 13.0]);
    }

    #[test]
    #[should_panic(expected = "Invalid layer initialization")]
    fn bias_row_mismatch_panics() {
        let weights = Matrix::zeros(3, 2);
        let biases = Matrix::zeros(2, 1);
        let _ = Layer::new(weights, biases, Activation::Sigmoid);
    }

    #[test]
    #[should_panic(expected = "Invalid layer initialization")]
    fn bias_must_be_a_column() {
        let weights = Matrix::zeros(3, 2);
        let biases = Matrix::zeros(3, 2);
        let _ = Layer::new(weights, biases, Activation::Sigmoid);
    }
}
