//! Fixed-topology feed-forward network used as an evolvable decision function.
//!
//! Hidden layers use `tanh`, the output layer uses the logistic sigmoid, so outputs lie
//! in `[0, 1]` and compare naturally against the 0.5 ascend threshold.
//!
//! Weights are stored flat, layer after layer. Within a layer each output neuron owns a
//! row of `inputs + 1` values, the last of which is its bias:
//!
//! ```text
//! layers = [5, 6, 1]
//! weights = [ n0: w0..w4 b | n1: w0..w4 b | ... | n5 | out: w0..w5 b ]
//!             └──── 6 × (5 + 1) = 36 ────────────────┘ └─ 1 × (6 + 1) = 7 ┘
//! ```

use gapwing_engine::WorldConfig;
use gapwing_evaluator::{
    DecisionFault, DecisionFunction, DecisionOutput, SensorInputs,
    decision::{OUTPUT_LEN, SENSOR_LEN},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::weights;

/// Input, hidden and output layer sizes used when none are configured.
pub const DEFAULT_LAYERS: [usize; 3] = [SENSOR_LEN, 6, OUTPUT_LEN];

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum NetworkError {
    #[display("network needs an input and an output layer, got {count} layers")]
    TooFewLayers { count: usize },
    #[display("layer {index} has no neurons")]
    EmptyLayer { index: usize },
    #[display("input layer has {found} neurons, expected {}", SENSOR_LEN)]
    InputSize { found: usize },
    #[display("output layer has {found} neurons, expected {}", OUTPUT_LEN)]
    OutputSize { found: usize },
    #[display("layers {layers:?} need {expected} weights, got {found}")]
    WeightCount {
        layers: Vec<usize>,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkParts")]
pub struct FeedForwardNetwork {
    layers: Vec<usize>,
    weights: Vec<f32>,
}

#[derive(Deserialize)]
struct NetworkParts {
    layers: Vec<usize>,
    weights: Vec<f32>,
}

impl TryFrom<NetworkParts> for FeedForwardNetwork {
    type Error = NetworkError;

    fn try_from(parts: NetworkParts) -> Result<Self, Self::Error> {
        Self::new(parts.layers, parts.weights)
    }
}

impl FeedForwardNetwork {
    pub fn new(layers: Vec<usize>, weights: Vec<f32>) -> Result<Self, NetworkError> {
        let expected = weight_count(&layers)?;
        if weights.len() != expected {
            return Err(NetworkError::WeightCount {
                layers,
                expected,
                found: weights.len(),
            });
        }
        Ok(Self { layers, weights })
    }

    pub fn random<R>(
        layers: Vec<usize>,
        max_weight: f32,
        rng: &mut R,
    ) -> Result<Self, NetworkError>
    where
        R: Rng + ?Sized,
    {
        let count = weight_count(&layers)?;
        Ok(Self {
            layers,
            weights: weights::random(rng, max_weight, count),
        })
    }

    #[must_use]
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Same topology, different weights.
    pub fn with_weights(&self, weights: Vec<f32>) -> Result<Self, NetworkError> {
        Self::new(self.layers.clone(), weights)
    }

    /// Propagates `inputs` through every layer.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not match the input layer size.
    #[must_use]
    pub fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        assert_eq!(inputs.len(), self.layers[0]);
        let last_layer = self.layers.len() - 2;
        let mut activations = inputs.to_vec();
        let mut rows = self.weights.as_slice();
        for (layer, pair) in self.layers.windows(2).enumerate() {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let mut next = Vec::with_capacity(fan_out);
            for _ in 0..fan_out {
                let (row, rest) = rows.split_at(fan_in + 1);
                rows = rest;
                let sum = row[fan_in]
                    + row[..fan_in]
                        .iter()
                        .zip(&activations)
                        .map(|(w, a)| w * a)
                        .sum::<f32>();
                next.push(if layer == last_layer {
                    sigmoid(sum)
                } else {
                    sum.tanh()
                });
            }
            activations = next;
        }
        activations
    }
}

/// Number of weights (including biases) a network with `layers` needs.
pub fn weight_count(layers: &[usize]) -> Result<usize, NetworkError> {
    if layers.len() < 2 {
        return Err(NetworkError::TooFewLayers {
            count: layers.len(),
        });
    }
    if let Some(index) = layers.iter().position(|size| *size == 0) {
        return Err(NetworkError::EmptyLayer { index });
    }
    if layers[0] != SENSOR_LEN {
        return Err(NetworkError::InputSize { found: layers[0] });
    }
    let output = layers[layers.len() - 1];
    if output != OUTPUT_LEN {
        return Err(NetworkError::OutputSize { found: output });
    }
    Ok(layers
        .windows(2)
        .map(|pair| (pair[0] + 1) * pair[1])
        .sum())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-input multipliers bringing world coordinates into roughly `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputScale([f32; SENSOR_LEN]);

impl InputScale {
    #[must_use]
    pub fn for_world(world: &WorldConfig) -> Self {
        let x = world.width.recip();
        let y = world.height.recip();
        Self([y, x, y, x, y])
    }

    #[must_use]
    pub fn apply(&self, inputs: &SensorInputs) -> [f32; SENSOR_LEN] {
        let mut scaled = inputs.to_array();
        for (value, scale) in scaled.iter_mut().zip(self.0) {
            *value *= scale;
        }
        scaled
    }
}

/// A network driving one agent.
#[derive(Debug, Clone)]
pub struct NetworkDecision<'a> {
    network: &'a FeedForwardNetwork,
    scale: InputScale,
}

impl<'a> NetworkDecision<'a> {
    #[must_use]
    pub fn new(network: &'a FeedForwardNetwork, scale: InputScale) -> Self {
        Self { network, scale }
    }
}

impl DecisionFunction for NetworkDecision<'_> {
    fn decide(&mut self, inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault> {
        let outputs = self.network.forward(&self.scale.apply(inputs));
        outputs.as_slice().try_into().map_err(|_| {
            DecisionFault::failed(format!("network produced {} outputs", outputs.len()))
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_weight_count() {
        assert_eq!(weight_count(&DEFAULT_LAYERS), Ok(43));
        assert_eq!(weight_count(&[5, 1]), Ok(6));
        assert!(matches!(
            weight_count(&[5]),
            Err(NetworkError::TooFewLayers { count: 1 })
        ));
        assert!(matches!(
            weight_count(&[4, 1]),
            Err(NetworkError::InputSize { found: 4 })
        ));
        assert!(matches!(
            weight_count(&[5, 0, 1]),
            Err(NetworkError::EmptyLayer { index: 1 })
        ));
    }

    #[test]
    fn test_wrong_weight_count_is_rejected() {
        assert!(matches!(
            FeedForwardNetwork::new(vec![5, 1], vec![0.0; 5]),
            Err(NetworkError::WeightCount {
                expected: 6,
                found: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_bias_only_network() {
        // zero input weights, bias 0 → sigmoid(0)
        let network = FeedForwardNetwork::new(vec![5, 1], vec![0.0; 6]).unwrap();
        assert_eq!(network.forward(&[1.0, 2.0, 3.0, 4.0, 5.0]), vec![0.5]);

        let mut weights = vec![0.0; 6];
        weights[0] = 2.0;
        weights[5] = -1.0;
        let network = network.with_weights(weights).unwrap();
        let out = network.forward(&[0.5, 0.0, 0.0, 0.0, 0.0])[0];
        assert!((out - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_random_network_output_in_unit_interval() {
        let mut rng = Pcg32::seed_from_u64(11);
        let world = WorldConfig::default();
        let scale = InputScale::for_world(&world);
        for _ in 0..20 {
            let network =
                FeedForwardNetwork::random(DEFAULT_LAYERS.to_vec(), 1.0, &mut rng).unwrap();
            let mut decision = NetworkDecision::new(&network, scale);
            let inputs = SensorInputs {
                agent_y: rng.random_range(0.0..750.0),
                top_x: rng.random_range(0.0..1000.0),
                top_y: 0.0,
                bottom_x: rng.random_range(0.0..1000.0),
                bottom_y: rng.random_range(450.0..750.0),
            };
            let [out] = decision.decide(&inputs).unwrap();
            assert!(out > 0.0 && out < 1.0, "{out}");
        }
    }

    #[test]
    fn test_network_serialization() {
        let network = FeedForwardNetwork::new(vec![5, 1], vec![0.5; 6]).unwrap();
        let json = serde_json::to_string(&network).unwrap();
        assert_eq!(
            json,
            r#"{"layers":[5,1],"weights":[0.5,0.5,0.5,0.5,0.5,0.5]}"#
        );
        let back: FeedForwardNetwork = serde_json::from_str(&json).unwrap();
        assert_eq!(back, network);

        let truncated = r#"{"layers":[5,1],"weights":[0.5]}"#;
        assert!(serde_json::from_str::<FeedForwardNetwork>(truncated).is_err());
    }
}
