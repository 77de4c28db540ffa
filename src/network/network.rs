use crate::activation::activation::Activation;
use crate::error::EngineError;
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::gradients::Gradients;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An ordered composition of dense layers.
///
/// Adjacent dimensions must agree: layer `i`'s output width equals layer
/// `i + 1`'s input width. The first layer's input width and the last layer's
/// output width are the externally visible contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a network from explicit layers. An empty list or a broken
    /// dimension chain is a construction bug and panics.
    pub fn new(layers: Vec<Layer>) -> Network {
        if layers.is_empty() {
            panic!("Cannot build a network with no layers");
        }
        for pair in layers.windows(2) {
            if pair[0].out_size() != pair[1].in_size() {
                panic!(
                    "Adjacent layers disagree: output width {} feeds input width {}",
                    pair[0].out_size(),
                    pair[1].in_size()
                );
            }
        }
        Network { layers }
    }

    /// Randomly initialized network with one layer per adjacent pair in
    /// `layer_sizes`. The shape description may come from a config file or a
    /// request, so bad shapes are rejected rather than aborted on.
    pub fn random<R: Rng>(
        layer_sizes: &[usize],
        activations: &[Activation],
        rng: &mut R,
    ) -> Result<Network, EngineError> {
        if layer_sizes.len() < 2 {
            return Err(EngineError::InvalidSpec(format!(
                "need at least 2 layer sizes, got {}",
                layer_sizes.len()
            )));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(EngineError::CountMismatch {
                what: "activations",
                got: activations.len(),
                expected: layer_sizes.len() - 1,
            });
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(pair, &activation)| Layer::random(pair[0], pair[1], activation, &mut *rng))
            .collect();
        Ok(Network::new(layers))
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].in_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].out_size()
    }

    /// Left fold of every layer's forward pass. `input` may be a single
    /// column or a batch of columns.
    pub fn feed_forward(&self, input: &Matrix) -> Matrix {
        if input.rows != self.input_size() {
            panic!(
                "Fed a ({} {}) input into a network expecting {} rows",
                input.rows,
                input.cols,
                self.input_size()
            );
        }
        self.layers
            .iter()
            .fold(input.clone(), |activation, layer| {
                layer.feed_forward(&activation)
            })
    }

    /// Mean squared error over matched sample columns.
    pub fn cost(&self, inputs: &[Matrix], targets: &[Matrix]) -> f64 {
        if inputs.is_empty() || inputs.len() != targets.len() {
            panic!(
                "Called cost on {} inputs and {} targets",
                inputs.len(),
                targets.len()
            );
        }

        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets.iter()) {
            if target.rows != self.output_size() || target.cols != input.cols {
                panic!(
                    "Cost target of size ({} {}) does not match network output width {}",
                    target.rows,
                    target.cols,
                    self.output_size()
                );
            }
            let output = self.feed_forward(input);
            total += (&output - target).squared_norm();
        }
        total / inputs.len() as f64
    }

    /// Gradients for a single `(input, target)` column pair.
    pub fn backprop(&self, input: &Matrix, target: &Matrix) -> Gradients {
        self.backprop_batch(input, target)
    }

    /// Reverse-mode gradients averaged over a batch.
    ///
    /// `inputs` is `in x k` and `targets` is `out x k`; column `j` of each is
    /// one sample pair. The forward pass caches every pre-activation `z` and
    /// activation, then the output error
    /// `delta = (a_L - target) .* act'(z_L)` is propagated backwards with
    /// `delta = W_i^T * delta .* act'(z_{i-1})`, accumulating
    /// `dW = delta * a^T / k` and `db = row_mean(delta)` per layer.
    pub fn backprop_batch(&self, inputs: &Matrix, targets: &Matrix) -> Gradients {
        if inputs.cols != targets.cols || inputs.cols == 0 {
            panic!(
                "Called backprop_batch on {} inputs and {} targets",
                inputs.cols, targets.cols
            );
        }
        if targets.rows != self.output_size() {
            panic!(
                "Backprop target width {} does not match network output width {}",
                targets.rows,
                self.output_size()
            );
        }

        let batch_size = inputs.cols as f64;

        // Forward pass, caching z and a per layer.
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut zs = Vec::with_capacity(self.layers.len());
        activations.push(self.check_input(inputs).clone());
        for layer in &self.layers {
            let z = layer.affine(activations.last().unwrap());
            let a = z.map(|x| layer.activation.function(x));
            zs.push(z);
            activations.push(a);
        }

        // Output error in pre-activation space.
        let last = self.layers.len() - 1;
        let mut delta = (activations.last().unwrap() - targets)
            .hadamard(&zs[last].map(|x| self.layers[last].activation.derivative(x)));

        let mut grads = Gradients::zeros_like(self);
        for i in (0..self.layers.len()).rev() {
            grads.layers[i].weights =
                (&delta * &activations[i].transpose()).scale(1.0 / batch_size);
            grads.layers[i].biases = delta.row_mean();

            if i > 0 {
                delta = (&self.layers[i].weights.transpose() * &delta)
                    .hadamard(&zs[i - 1].map(|x| self.layers[i - 1].activation.derivative(x)));
            }
        }

        grads
    }

    /// One gradient-descent step: `W -= lr * dW; b -= lr * db` per layer,
    /// in place.
    pub fn apply_gradients(&mut self, gradients: &Gradients, learning_rate: f64) {
        if gradients.layers.len() != self.layers.len() {
            panic!(
                "Applied gradients for {} layers to a network with {}",
                gradients.layers.len(),
                self.layers.len()
            );
        }
        for (layer, grad) in self.layers.iter_mut().zip(gradients.layers.iter()) {
            layer.weights = &layer.weights - &grad.weights.scale(learning_rate);
            layer.biases = &layer.biases - &grad.biases.scale(learning_rate);
        }
    }

    fn check_input<'a>(&self, input: &'a Matrix) -> &'a Matrix {
        if input.rows != self.input_size() {
            panic!(
                "Fed a ({} {}) input into a network expecting {} rows",
                input.rows,
                input.cols,
                self.input_size()
            );
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity_network() -> Network {
        // Two identity layers that together compute f(x) = x.
        let eye = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]);
        let zero = Matrix::zeros(2, 1);
        Network::new(vec![
            Layer::new(eye.clone(), zero.clone(), Activation::Identity),
            Layer::new(eye, zero, Activation::Identity),
        ])
    }

    #[test]
    fn feed_forward_output_width_matches_last_layer() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = Network::random(
            &[4, 7, 3],
            &[Activation::ReLU, Activation::Sigmoid],
            &mut rng,
        )
        .unwrap();

        let input = Matrix::zeros(4, 1);
        let output = network.feed_forward(&input);
        assert_eq!(output.rows, 3);
        assert_eq!(output.cols, 1);

        let batch = Matrix::zeros(4, 5);
        let output = network.feed_forward(&batch);
        assert_eq!(output.rows, 3);
        assert_eq!(output.cols, 5);
    }

    #[test]
    fn cost_is_zero_iff_perfect() {
        let network = identity_network();
        let samples = vec![
            Matrix::from_vec(2, 1, vec![0.5, -0.5]),
            Matrix::from_vec(2, 1, vec![1.0, 2.0]),
        ];

        assert_eq!(network.cost(&samples, &samples), 0.0);

        let off_targets = vec![
            Matrix::from_vec(2, 1, vec![0.5, -0.5]),
            Matrix::from_vec(2, 1, vec![1.0, 3.0]),
        ];
        let cost = network.cost(&samples, &off_targets);
        assert!(cost > 0.0);
        // mean over 2 samples of squared norms {0, 1}
        assert!((cost - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cost_is_never_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        let network =
            Network::random(&[2, 3, 2], &[Activation::Sigmoid, Activation::Sigmoid], &mut rng)
                .unwrap();
        let inputs = vec![Matrix::from_vec(2, 1, vec![0.3, 0.7])];
        let targets = vec![Matrix::from_vec(2, 1, vec![1.0, 0.0])];
        assert!(network.cost(&inputs, &targets) >= 0.0);
    }

    #[test]
    fn backprop_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut network =
            Network::random(&[2, 2, 1], &[Activation::Sigmoid, Activation::Sigmoid], &mut rng)
                .unwrap();

        let inputs = Matrix::from_vec(2, 2, vec![0.0, 1.0, 1.0, 0.0]);
        let targets = Matrix::from_vec(1, 2, vec![1.0, 1.0]);
        let grads = network.backprop_batch(&inputs, &targets);

        let input_cols = vec![inputs.column(0), inputs.column(1)];
        let target_cols = vec![targets.column(0), targets.column(1)];

        // The gradients follow the 1/2 * ||a - t||^2 convention, while
        // cost() reports the plain squared norm, so the analytic gradient is
        // half the numeric derivative of cost().
        let eps = 1e-6;
        for layer_idx in 0..network.layers.len() {
            for w_idx in 0..network.layers[layer_idx].weights.as_slice().len() {
                let original = network.layers[layer_idx].weights.element_at(w_idx);

                network.layers[layer_idx]
                    .weights
                    .set_element_at(w_idx, original + eps);
                let plus = network.cost(&input_cols, &target_cols);
                network.layers[layer_idx]
                    .weights
                    .set_element_at(w_idx, original - eps);
                let minus = network.cost(&input_cols, &target_cols);
                network.layers[layer_idx]
                    .weights
                    .set_element_at(w_idx, original);

                let numeric = 0.5 * (plus - minus) / (2.0 * eps);
                let analytic = grads.layers[layer_idx].weights.element_at(w_idx);
                assert!(
                    (numeric - analytic).abs() < 1e-6,
                    "layer {layer_idx} weight {w_idx}: numeric {numeric} vs analytic {analytic}"
                );
            }
        }
    }

    #[test]
    fn single_sample_backprop_equals_batch_of_one() {
        let mut rng = StdRng::seed_from_u64(9);
        let network =
            Network::random(&[2, 3, 1], &[Activation::ReLU, Activation::Sigmoid], &mut rng)
                .unwrap();
        let input = Matrix::from_vec(2, 1, vec![0.2, 0.8]);
        let target = Matrix::from_vec(1, 1, vec![0.0]);

        let single = network.backprop(&input, &target);
        let batch = network.backprop_batch(&input, &target);
        for (a, b) in single.layers.iter().zip(batch.layers.iter()) {
            assert_eq!(a.weights, b.weights);
            assert_eq!(a.biases, b.biases);
        }
    }

    #[test]
    fn random_rejects_bad_shape_lists() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Network::random(&[4], &[], &mut rng),
            Err(EngineError::InvalidSpec(_))
        ));
        assert!(matches!(
            Network::random(&[4, 2], &[], &mut rng),
            Err(EngineError::CountMismatch { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "expecting 2 rows")]
    fn feed_forward_panics_on_wrong_input_width() {
        let network = identity_network();
        let input = Matrix::zeros(3, 1);
        let _ = network.feed_forward(&input);
    }

    #[test]
    #[should_panic(expected = "Called cost")]
    fn cost_panics_on_length_mismatch() {
        let network = identity_network();
        let inputs = vec![Matrix::zeros(2, 1)];
        let targets: Vec<Matrix> = vec![];
        let _ = network.cost(&inputs, &targets);
    }

    #[test]
    #[should_panic(expected = "Adjacent layers disagree")]
    fn adjacent_dimension_mismatch_panics() {
        let first = Layer::new(Matrix::zeros(3, 2), Matrix::zeros(3, 1), Activation::Identity);
        let second = Layer::new(Matrix::zeros(1, 2), Matrix::zeros(1, 1), Activation::Identity);
        let _ = Network::new(vec![first, second]);
    }
}
