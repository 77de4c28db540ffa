use crate::activation::activation::Activation;
use crate::error::EngineError;
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Flat persistence contract.
///
/// Weights and biases are emitted as flat `f64` sequences in layer-major,
/// then row-major order. Reconstruction needs the same `layer_sizes` and
/// activation-name list that were current at dump time and revalidates all
/// element counts, because the data may come back from storage or the
/// network.
impl Network {
    pub fn dump_weights(&self) -> Vec<f64> {
        let mut dumped = Vec::new();
        for layer in &self.layers {
            dumped.extend_from_slice(layer.weights.as_slice());
        }
        dumped
    }

    pub fn dump_biases(&self) -> Vec<f64> {
        let mut dumped = Vec::new();
        for layer in &self.layers {
            dumped.extend_from_slice(layer.biases.as_slice());
        }
        dumped
    }

    /// The widths this network was built from: input width, every hidden
    /// width, output width.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(|layer| layer.out_size()));
        sizes
    }

    pub fn activation_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.activation.name()).collect()
    }

    /// Rebuilds a network from flat dumps.
    ///
    /// Every disagreement between the declared sizes and the supplied data
    /// is a recoverable error; this path never panics on bad input.
    pub fn from_dump<S: AsRef<str>>(
        layer_sizes: &[usize],
        activation_names: &[S],
        weights: &[f64],
        biases: &[f64],
    ) -> Result<Network, EngineError> {
        if layer_sizes.len() < 2 {
            return Err(EngineError::InvalidSpec(format!(
                "need at least 2 layer sizes, got {}",
                layer_sizes.len()
            )));
        }
        if activation_names.len() != layer_sizes.len() - 1 {
            return Err(EngineError::CountMismatch {
                what: "activations",
                got: activation_names.len(),
                expected: layer_sizes.len() - 1,
            });
        }

        let expected_weights: usize = layer_sizes.windows(2).map(|pair| pair[0] * pair[1]).sum();
        if weights.len() != expected_weights {
            return Err(EngineError::CountMismatch {
                what: "weights",
                got: weights.len(),
                expected: expected_weights,
            });
        }
        let expected_biases: usize = layer_sizes[1..].iter().sum();
        if biases.len() != expected_biases {
            return Err(EngineError::CountMismatch {
                what: "biases",
                got: biases.len(),
                expected: expected_biases,
            });
        }

        let mut layers = Vec::with_capacity(layer_sizes.len() - 1);
        let mut w_offset = 0;
        let mut b_offset = 0;
        for (pair, name) in layer_sizes.windows(2).zip(activation_names.iter()) {
            let (input_size, output_size) = (pair[0], pair[1]);
            let activation = Activation::from_name(name.as_ref())?;

            let w_len = input_size * output_size;
            let layer_weights = Matrix::from_vec(
                output_size,
                input_size,
                weights[w_offset..w_offset + w_len].to_vec(),
            );
            let layer_biases =
                Matrix::from_vec(output_size, 1, biases[b_offset..b_offset + output_size].to_vec());
            w_offset += w_len;
            b_offset += output_size;

            layers.push(Layer::new(layer_weights, layer_biases, activation));
        }

        Ok(Network::new(layers))
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<(), EngineError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by
    /// `save_json`. Serde bypasses the shape-checking constructors, so the
    /// loaded structure is revalidated before it is trusted.
    pub fn load_json(path: &str) -> Result<Network, EngineError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let network: Network = serde_json::from_reader(reader)?;
        network.validate()?;
        Ok(network)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.layers.is_empty() {
            return Err(EngineError::InvalidSpec("network has no layers".to_string()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if !layer.weights.is_consistent() || !layer.biases.is_consistent() {
                return Err(EngineError::InvalidSpec(format!(
                    "layer {i} has a buffer that disagrees with its declared shape"
                )));
            }
            if layer.biases.cols != 1 || layer.biases.rows != layer.weights.rows {
                return Err(EngineError::InvalidSpec(format!(
                    "layer {i} biases of size ({} {}) do not match weights of size ({} {})",
                    layer.biases.rows, layer.biases.cols, layer.weights.rows, layer.weights.cols
                )));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].out_size() != pair[1].in_size() {
                return Err(EngineError::InvalidSpec(format!(
                    "layer {} output width {} feeds layer {} input width {}",
                    i,
                    pair[0].out_size(),
                    i + 1,
                    pair[1].in_size()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn probe_network() -> Network {
        let mut rng = StdRng::seed_from_u64(42);
        Network::random(
            &[3, 4, 2],
            &[Activation::ReLU, Activation::Sigmoid],
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn dump_lengths_follow_layer_sizes() {
        let network = probe_network();
        assert_eq!(network.layer_sizes(), vec![3, 4, 2]);
        assert_eq!(network.dump_weights().len(), 3 * 4 + 4 * 2);
        assert_eq!(network.dump_biases().len(), 4 + 2);
        assert_eq!(network.activation_names(), vec!["relu", "sigmoid"]);
    }

    #[test]
    fn dump_and_reconstruct_is_bit_identical() {
        let network = probe_network();
        let rebuilt = Network::from_dump(
            &network.layer_sizes(),
            &network.activation_names(),
            &network.dump_weights(),
            &network.dump_biases(),
        )
        .unwrap();

        let probe = Matrix::from_vec(3, 1, vec![0.25, -1.5, 3.0]);
        let original = network.feed_forward(&probe);
        let reloaded = rebuilt.feed_forward(&probe);
        assert_eq!(original.as_slice(), reloaded.as_slice());
    }

    #[test]
    fn from_dump_rejects_wrong_weight_count() {
        let network = probe_network();
        let mut weights = network.dump_weights();
        weights.pop();
        let err = Network::from_dump(
            &network.layer_sizes(),
            &network.activation_names(),
            &weights,
            &network.dump_biases(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::CountMismatch { what: "weights", .. }
        ));
    }

    #[test]
    fn from_dump_rejects_wrong_bias_count() {
        let network = probe_network();
        let mut biases = network.dump_biases();
        biases.push(0.0);
        let err = Network::from_dump(
            &network.layer_sizes(),
            &network.activation_names(),
            &network.dump_weights(),
            &biases,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::CountMismatch { what: "biases", .. }
        ));
    }

    #[test]
    fn from_dump_rejects_unknown_activation_names() {
        let network = probe_network();
        let err = Network::from_dump(
            &network.layer_sizes(),
            &["relu", "softplus"],
            &network.dump_weights(),
            &network.dump_biases(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownActivation(_)));
    }

    #[test]
    fn from_dump_rejects_short_size_lists() {
        let err = Network::from_dump::<&str>(&[4], &[], &[], &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSpec(_)));
    }

    #[test]
    fn json_round_trip_preserves_outputs() {
        let network = probe_network();
        let dir = std::env::temp_dir().join("tandem_nn_dump_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("network.json");
        let path = path.to_str().unwrap();

        network.save_json(path).unwrap();
        let reloaded = Network::load_json(path).unwrap();
        std::fs::remove_file(path).unwrap();

        let probe = Matrix::from_vec(3, 1, vec![1.0, 0.0, -1.0]);
        assert_eq!(
            network.feed_forward(&probe).as_slice(),
            reloaded.feed_forward(&probe).as_slice()
        );
    }
}
