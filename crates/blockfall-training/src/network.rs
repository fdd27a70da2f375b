//! Minimal feed-forward network used as an evolvable placement scorer.
//!
//! A network with topology `{input_nodes: n, hidden_nodes: h, hidden_layers: k}` has
//! `k + 1` dense layers:
//!
//! ```text
//! input (n) → h×n → [h×h] × (k − 1) → 1×h → output (1)
//! ```
//!
//! Hidden layers use ReLU; the output layer uses the topology's
//! [`output_activation`](Topology::output_activation). Weights and biases are
//! initialized independently and uniformly in `[-1, 1]`.
//!
//! Networks are evolved, never trained by gradient: [`NeuralNetwork::mutate`] adds
//! Gaussian noise and [`NeuralNetwork::crossover`] mixes two parents entry by entry.
//!
//! # Example
//!
//! ```
//! use blockfall_training::network::{NeuralNetwork, Topology};
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! let mut rng = Pcg32::seed_from_u64(0);
//! let a = NeuralNetwork::random(Topology::default(), &mut rng).unwrap();
//! let b = NeuralNetwork::random(Topology::default(), &mut rng).unwrap();
//!
//! let mut child = a.crossover(&b, &mut rng).unwrap();
//! child.mutate(0.1, &mut rng);
//! assert!(child.predict(&[0.0; 6]) >= 0.0);
//! ```

use std::iter;

use blockfall_evaluator::{
    board_feature::{BoardFeatures, FEATURE_COUNT},
    placement_evaluator::PlacementEvaluator,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::weights;

/// Activation function of the output layer.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `max(0, x)`: outputs are never negative.
    #[default]
    #[display("relu")]
    Relu,
    /// Identity.
    #[display("linear")]
    Linear,
}

impl Activation {
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Linear => x,
        }
    }
}

/// Shape of a network. Two networks can only be crossed when their topologies are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{input_nodes}-{hidden_nodes}x{hidden_layers}-1 ({output_activation})")]
#[serde(default)]
pub struct Topology {
    pub input_nodes: usize,
    pub hidden_nodes: usize,
    pub hidden_layers: usize,
    pub output_activation: Activation,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            input_nodes: FEATURE_COUNT,
            hidden_nodes: 4,
            hidden_layers: 1,
            output_activation: Activation::Relu,
        }
    }
}

impl Topology {
    /// Checks that every layer has at least one node.
    pub fn validate(&self) -> Result<(), InvalidTopology> {
        let reason = if self.input_nodes == 0 {
            "no input nodes"
        } else if self.hidden_nodes == 0 {
            "no hidden nodes"
        } else if self.hidden_layers == 0 {
            "no hidden layers"
        } else {
            return Ok(());
        };
        Err(InvalidTopology {
            topology: *self,
            reason,
        })
    }

    /// Returns `(outputs, inputs)` of every layer, input side first.
    fn layer_sizes(&self) -> impl Iterator<Item = (usize, usize)> {
        let hidden = self.hidden_nodes;
        iter::once((hidden, self.input_nodes))
            .chain(iter::repeat_n((hidden, hidden), self.hidden_layers - 1))
            .chain(iter::once((1, hidden)))
    }
}

/// A network with an unusable topology was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid network topology {topology}: {reason}")]
pub struct InvalidTopology {
    pub topology: Topology,
    pub reason: &'static str,
}

/// Crossover was attempted between networks of different topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cannot cross networks of different topology: {expected} and {found}")]
pub struct ShapeMismatch {
    pub expected: Topology,
    pub found: Topology,
}

/// One dense layer: a row-major `outputs × inputs` weight matrix and a bias per output.
#[derive(Debug, Clone, PartialEq)]
struct Layer {
    inputs: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    fn random<R>(outputs: usize, inputs: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            inputs,
            weights: weights::random(rng, outputs * inputs),
            biases: weights::random(rng, outputs),
        }
    }

    fn forward(&self, input: &[f32], activation: Activation) -> Vec<f32> {
        iter::zip(self.weights.chunks_exact(self.inputs), &self.biases)
            .map(|(row, bias)| {
                let sum: f32 = iter::zip(row, input).map(|(w, x)| w * x).sum();
                activation.apply(sum + bias)
            })
            .collect()
    }

    fn mutate<R>(&mut self, rate: f32, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        weights::mutate(&mut self.weights, rate, rng);
        weights::mutate(&mut self.biases, rate, rng);
    }

    fn crossover<R>(&self, partner: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            inputs: self.inputs,
            weights: weights::uniform_crossover(&self.weights, &partner.weights, rng),
            biases: weights::uniform_crossover(&self.biases, &partner.biases, rng),
        }
    }
}

/// Feed-forward network with a single scalar output.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNetwork {
    topology: Topology,
    layers: Vec<Layer>,
}

impl NeuralNetwork {
    /// Creates a network with every weight and bias drawn uniformly from `[-1, 1]`.
    pub fn random<R>(topology: Topology, rng: &mut R) -> Result<Self, InvalidTopology>
    where
        R: Rng + ?Sized,
    {
        topology.validate()?;
        let layers = topology
            .layer_sizes()
            .map(|(outputs, inputs)| Layer::random(outputs, inputs, rng))
            .collect();
        Ok(Self { topology, layers })
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Total number of weights and biases.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    /// Runs a forward pass.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len()` differs from the topology's input node count.
    #[must_use]
    pub fn predict(&self, inputs: &[f32]) -> f32 {
        assert_eq!(inputs.len(), self.topology.input_nodes);
        let last = self.layers.len() - 1;
        let mut values = inputs.to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            let activation = if i == last {
                self.topology.output_activation
            } else {
                Activation::Relu
            };
            values = layer.forward(&values, activation);
        }
        values[0]
    }

    /// Perturbs each weight and bias independently with probability `rate`.
    pub fn mutate<R>(&mut self, rate: f32, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for layer in &mut self.layers {
            layer.mutate(rate, rng);
        }
    }

    /// Builds a child taking each weight and bias from either parent with probability 0.5.
    pub fn crossover<R>(&self, partner: &Self, rng: &mut R) -> Result<Self, ShapeMismatch>
    where
        R: Rng + ?Sized,
    {
        if self.topology != partner.topology {
            return Err(ShapeMismatch {
                expected: self.topology,
                found: partner.topology,
            });
        }
        let layers = iter::zip(&self.layers, &partner.layers)
            .map(|(a, b)| a.crossover(b, rng))
            .collect();
        Ok(Self {
            topology: self.topology,
            layers,
        })
    }
}

impl PlacementEvaluator for NeuralNetwork {
    #[inline]
    fn evaluate_placement(&self, features: &BoardFeatures) -> f32 {
        self.predict(&features.to_array())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn topology(hidden_layers: usize) -> Topology {
        Topology {
            hidden_layers,
            ..Topology::default()
        }
    }

    fn fixed(output_activation: Activation) -> NeuralNetwork {
        NeuralNetwork {
            topology: Topology {
                input_nodes: 2,
                hidden_nodes: 2,
                hidden_layers: 1,
                output_activation,
            },
            layers: vec![
                Layer {
                    inputs: 2,
                    weights: vec![1.0, -1.0, 0.5, 0.5],
                    biases: vec![0.0, 1.0],
                },
                Layer {
                    inputs: 2,
                    weights: vec![1.0, -2.0],
                    biases: vec![0.5],
                },
            ],
        }
    }

    #[test]
    fn test_layer_shapes() {
        let mut rng = Pcg32::seed_from_u64(0);
        let network = NeuralNetwork::random(topology(3), &mut rng).unwrap();
        assert_eq!(network.layers.len(), 4);
        // 4×6 + 4, 4×4 + 4 twice, 1×4 + 1
        assert_eq!(network.parameter_count(), 28 + 20 + 20 + 5);
    }

    #[test]
    fn test_initial_values_in_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let network = NeuralNetwork::random(topology(2), &mut rng).unwrap();
        for layer in &network.layers {
            assert!(
                layer
                    .weights
                    .iter()
                    .chain(&layer.biases)
                    .all(|v| (-1.0..=1.0).contains(v))
            );
        }
    }

    #[test]
    fn test_invalid_topology() {
        let mut rng = Pcg32::seed_from_u64(2);
        let err = NeuralNetwork::random(topology(0), &mut rng).unwrap_err();
        assert_eq!(err.reason, "no hidden layers");
        let no_inputs = Topology {
            input_nodes: 0,
            ..Topology::default()
        };
        assert!(no_inputs.validate().is_err());
    }

    #[test]
    fn test_predict_relu_clamps_output() {
        // hidden = relu([2 - 1, 1 + 1.5]) = [1, 2.5]; output = 1 - 5 + 0.5 = -3.5
        assert!(fixed(Activation::Relu).predict(&[2.0, 1.0]).abs() < f32::EPSILON);
        assert!((fixed(Activation::Linear).predict(&[2.0, 1.0]) - -3.5).abs() < 1e-6);
    }

    #[test]
    fn test_default_network_output_is_non_negative() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..20 {
            let network = NeuralNetwork::random(Topology::default(), &mut rng).unwrap();
            assert!(network.predict(&[3.0, 1.0, 0.0, 5.0, 1.0, 0.0]) >= 0.0);
        }
    }

    #[test]
    fn test_crossover_shape_mismatch() {
        let mut rng = Pcg32::seed_from_u64(4);
        let a = NeuralNetwork::random(topology(2), &mut rng).unwrap();
        let b = NeuralNetwork::random(topology(3), &mut rng).unwrap();
        let err = a.crossover(&b, &mut rng).unwrap_err();
        assert_eq!(err.expected.hidden_layers, 2);
        assert_eq!(err.found.hidden_layers, 3);
        assert!(err.to_string().contains("6-4x2-1"));
    }

    #[test]
    fn test_crossover_mixes_parent_entries() {
        let mut rng = Pcg32::seed_from_u64(5);
        let a = NeuralNetwork::random(topology(2), &mut rng).unwrap();
        let b = NeuralNetwork::random(topology(2), &mut rng).unwrap();
        let child = a.crossover(&b, &mut rng).unwrap();
        assert_eq!(child.topology(), a.topology());
        for ((c, a), b) in child.layers.iter().zip(&a.layers).zip(&b.layers) {
            for (i, v) in c.weights.iter().enumerate() {
                assert!(*v == a.weights[i] || *v == b.weights[i]);
            }
            for (i, v) in c.biases.iter().enumerate() {
                assert!(*v == a.biases[i] || *v == b.biases[i]);
            }
        }
        assert_ne!(child, a);
        assert_ne!(child, b);
    }

    #[test]
    fn test_mutate() {
        let mut rng = Pcg32::seed_from_u64(6);
        let original = NeuralNetwork::random(Topology::default(), &mut rng).unwrap();

        let mut unchanged = original.clone();
        unchanged.mutate(0.0, &mut rng);
        assert_eq!(unchanged, original);

        let mut mutated = original.clone();
        mutated.mutate(1.0, &mut rng);
        for (m, o) in mutated.layers.iter().zip(&original.layers) {
            assert!(iter::zip(&m.weights, &o.weights).all(|(a, b)| a != b));
        }
    }

    #[test]
    fn test_activation_from_str() {
        assert_eq!("linear".parse::<Activation>().unwrap(), Activation::Linear);
        assert_eq!(Activation::Relu.to_string(), "relu");
    }
}
