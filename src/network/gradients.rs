use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Per-layer cost gradients, shaped identically to the layer parameters.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

/// One `(weight-gradient, bias-gradient)` pair per network layer, in layer
/// order. Created per batch, folded additively, applied once, then dropped.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub layers: Vec<LayerGradients>,
}

impl Gradients {
    /// Zero gradients matching `network`'s parameter shapes.
    pub fn zeros_like(network: &Network) -> Gradients {
        let layers = network
            .layers
            .iter()
            .map(|layer| LayerGradients {
                weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
                biases: Matrix::zeros(layer.biases.rows, layer.biases.cols),
            })
            .collect();
        Gradients { layers }
    }

    /// Elementwise accumulation. Shapes must agree; they always do when both
    /// sides came from the same network.
    pub fn add_assign(&mut self, other: &Gradients) {
        if self.layers.len() != other.layers.len() {
            panic!(
                "Called add_assign on gradients for {} and {} layers",
                self.layers.len(),
                other.layers.len()
            );
        }
        for (mine, theirs) in self.layers.iter_mut().zip(other.layers.iter()) {
            mine.weights = &mine.weights + &theirs.weights;
            mine.biases = &mine.biases + &theirs.biases;
        }
    }

    /// Scales every gradient in place, e.g. to weight a worker's
    /// contribution by its share of the round's samples.
    pub fn scale(&mut self, factor: f64) {
        for layer in &mut self.layers {
            layer.weights = layer.weights.scale(factor);
            layer.biases = layer.biases.scale(factor);
        }
    }
}
