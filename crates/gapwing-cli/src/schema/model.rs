use anyhow::Context as _;
use chrono::{DateTime, Utc};
use gapwing_training::{genetic::Individual, network::FeedForwardNetwork};
use serde::{Deserialize, Serialize};

/// Best network of a training run, as written by `gapwing train`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrainedModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f64,
    pub layers: Vec<usize>,
    pub weights: Vec<f32>,
}

impl TrainedModel {
    pub fn from_individual(name: String, trained_at: DateTime<Utc>, best: &Individual) -> Self {
        Self {
            name,
            trained_at,
            final_fitness: best.fitness(),
            layers: best.network().layers().to_vec(),
            weights: best.network().weights().to_vec(),
        }
    }

    pub fn to_network(&self) -> anyhow::Result<FeedForwardNetwork> {
        FeedForwardNetwork::new(self.layers.clone(), self.weights.clone())
            .with_context(|| format!("Model {} has an invalid network", self.name))
    }
}

#[cfg(test)]
mod tests {
    use gapwing_training::network::DEFAULT_LAYERS;
    use rand::SeedableRng as _;

    use super::*;

    #[test]
    fn test_model_restores_network() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let network =
            FeedForwardNetwork::random(DEFAULT_LAYERS.to_vec(), 1.0, &mut rng).unwrap();
        let individual = Individual::new(network.clone());
        let model = TrainedModel::from_individual("test".to_owned(), Utc::now(), &individual);
        assert_eq!(model.layers, DEFAULT_LAYERS);
        assert_eq!(model.to_network().unwrap(), network);

        let json = serde_json::to_string(&model).unwrap();
        let back: TrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_truncated_weights_are_rejected() {
        let model = TrainedModel {
            name: "broken".to_owned(),
            trained_at: Utc::now(),
            final_fitness: 0.0,
            layers: vec![5, 1],
            weights: vec![0.0; 3],
        };
        assert!(model.to_network().is_err());
    }
}
