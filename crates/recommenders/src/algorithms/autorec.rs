//! User-based autoencoder (AutoRec).
//!
//! Every user is a vector over all items holding `rating / max_rating`
//! (0 where unrated). A network with one sigmoid hidden layer and a sigmoid
//! output layer learns to reconstruct those vectors (mean squared error,
//! RMSprop, mini-batches). After training, the reconstruction of a user's
//! vector holds the predicted ratings for every item.
//!
//! The network is a pair of `candle` layers trained through autograd.
//! Weights are drawn from the caller's seeded RNG, so a fixed seed gives
//! the same model.

use crate::error::{AlgorithmError, PredictionImpossible, Result};
use crate::traits::{Algorithm, Model};
use candle_core::backprop::GradStore;
use candle_core::{Device, Tensor, Var};
use candle_nn::Optimizer;
use data_loader::{MovieId, TrainSet, UserId};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use tracing::{debug, info};

/// Reconstructions below this are treated as "no prediction"
const MIN_VALID_OUTPUT: f32 = 0.001;

#[derive(Debug, Clone)]
pub struct AutoRec {
    epochs: usize,
    hidden_dimensions: usize,
    learning_rate: f32,
    batch_size: usize,
}

impl AutoRec {
    pub fn new() -> Self {
        Self {
            epochs: 100,
            hidden_dimensions: 100,
            learning_rate: 0.01,
            batch_size: 100,
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_hidden_dimensions(mut self, hidden: usize) -> Self {
        self.hidden_dimensions = hidden;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String| AlgorithmError::InvalidParameter {
            name: name.to_string(),
            value,
        };
        if self.hidden_dimensions == 0 {
            return Err(invalid("hidden_dimensions", self.hidden_dimensions.to_string()));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", self.batch_size.to_string()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", self.learning_rate.to_string()));
        }
        Ok(())
    }
}

impl Default for AutoRec {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for AutoRec {
    fn name(&self) -> &str {
        "AutoRec"
    }

    fn fit(&self, trainset: Arc<TrainSet>, rng: &mut StdRng) -> Result<Box<dyn Model>> {
        self.validate()?;
        if trainset.is_empty() {
            return Err(AlgorithmError::EmptyTrainSet);
        }

        let device = Device::Cpu;
        let n_items = trainset.n_items();
        let scale_max = trainset.rating_scale().max;
        let inputs: Vec<SparseRow> = (0..trainset.n_users())
            .map(|uid| {
                trainset
                    .user_ratings(uid)
                    .iter()
                    .map(|&(iid, r)| (iid, r / scale_max))
                    .collect()
            })
            .collect();

        let network = Network::new(n_items, self.hidden_dimensions, rng, &device)?;
        let mut optimizer = RmsProp::new(
            network.vars(),
            ParamsRmsProp {
                learning_rate: self.learning_rate as f64,
                ..Default::default()
            },
        )?;

        info!(
            "Training AutoRec: {} visible, {} hidden, {} epochs",
            n_items, self.hidden_dimensions, self.epochs
        );

        for epoch in 0..self.epochs {
            let mut loss = 0.0f64;
            for batch in inputs.chunks(self.batch_size) {
                let x = dense_batch(batch, n_items, &device)?;
                let batch_loss = network.loss(&x)?;
                optimizer.backward_step(&batch_loss)?;
                loss += batch_loss.to_scalar::<f32>()? as f64 * batch.len() as f64;
            }
            debug!("AutoRec epoch {} loss {:.6}", epoch, loss / inputs.len() as f64);
        }

        let mut predicted = Vec::with_capacity(inputs.len() * n_items);
        for batch in inputs.chunks(self.batch_size) {
            let x = dense_batch(batch, n_items, &device)?;
            predicted.extend(network.forward(&x)?.flatten_all()?.to_vec1::<f32>()?);
        }

        Ok(Box::new(AutoRecModel {
            trainset,
            n_items,
            predicted,
            scale_max,
        }))
    }
}

/// (inner item, normalized rating) for the rated items of one user
type SparseRow = Vec<(usize, f32)>;

/// Rows of a batch as a dense (batch, visible) tensor, zeros where unrated
fn dense_batch(rows: &[SparseRow], visible: usize, device: &Device) -> Result<Tensor> {
    let mut data = vec![0.0f32; rows.len() * visible];
    for (r, row) in rows.iter().enumerate() {
        for &(i, x) in row {
            data[r * visible + i] = x;
        }
    }
    Ok(Tensor::from_vec(data, (rows.len(), visible), device)?)
}

/// visible -> hidden -> visible, both layers sigmoid
struct Network {
    /// visible x hidden
    w1: Var,
    b1: Var,
    /// hidden x visible
    w2: Var,
    b2: Var,
}

impl Network {
    fn new(visible: usize, hidden: usize, rng: &mut StdRng, device: &Device) -> Result<Self> {
        let init = Normal::new(0.0f32, 0.1)
            .map_err(|e| AlgorithmError::Distribution(e.to_string()))?;
        let mut var = |shape: (usize, usize)| -> Result<Var> {
            let data: Vec<f32> = (0..shape.0 * shape.1).map(|_| init.sample(rng)).collect();
            let tensor = Tensor::from_vec(data, shape, device)?;
            Ok(Var::from_tensor(&tensor)?)
        };

        Ok(Self {
            w1: var((visible, hidden))?,
            b1: var((1, hidden))?,
            w2: var((hidden, visible))?,
            b2: var((1, visible))?,
        })
    }

    fn vars(&self) -> Vec<Var> {
        vec![
            self.w1.clone(),
            self.b1.clone(),
            self.w2.clone(),
            self.b2.clone(),
        ]
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let hidden = candle_nn::ops::sigmoid(&x.matmul(&self.w1)?.broadcast_add(&self.b1)?)?;
        candle_nn::ops::sigmoid(&hidden.matmul(&self.w2)?.broadcast_add(&self.b2)?)
    }

    /// Mean squared reconstruction error over every cell of the batch
    fn loss(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        candle_nn::loss::mse(&self.forward(x)?, x)
    }
}

#[derive(Debug, Clone, Copy)]
struct ParamsRmsProp {
    learning_rate: f64,
    rho: f64,
    epsilon: f64,
}

impl Default for ParamsRmsProp {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            rho: 0.9,
            epsilon: 1e-7,
        }
    }
}

/// RMSprop with one squared-gradient cache per variable
struct RmsProp {
    vars: Vec<(Var, Var)>,
    params: ParamsRmsProp,
}

impl Optimizer for RmsProp {
    type Config = ParamsRmsProp;

    fn new(vars: Vec<Var>, params: ParamsRmsProp) -> candle_core::Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(|var| {
                let cache = Var::zeros(var.shape(), var.dtype(), var.device())?;
                Ok((var, cache))
            })
            .collect::<candle_core::Result<Vec<_>>>()?;
        Ok(Self { vars, params })
    }

    fn step(&mut self, grads: &GradStore) -> candle_core::Result<()> {
        let ParamsRmsProp {
            learning_rate,
            rho,
            epsilon,
        } = self.params;
        for (var, cache) in &self.vars {
            let Some(grad) = grads.get(var) else {
                continue;
            };
            let next_cache = cache
                .affine(rho, 0.0)?
                .add(&grad.sqr()?.affine(1.0 - rho, 0.0)?)?;
            let update = grad.div(&next_cache.sqrt()?.affine(1.0, epsilon)?)?;
            var.set(&var.sub(&update.affine(learning_rate, 0.0)?)?)?;
            cache.set(&next_cache)?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.params.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f64) {
        self.params.learning_rate = learning_rate;
    }
}

struct AutoRecModel {
    trainset: Arc<TrainSet>,
    n_items: usize,
    /// users x items reconstructions in [0, 1]
    predicted: Vec<f32>,
    scale_max: f32,
}

impl Model for AutoRecModel {
    fn trainset(&self) -> &TrainSet {
        &self.trainset
    }

    fn estimate(
        &mut self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> std::result::Result<f32, PredictionImpossible> {
        let (Some(uid), Some(iid)) = (
            self.trainset.to_inner_uid(user_id),
            self.trainset.to_inner_iid(movie_id),
        ) else {
            return Err(PredictionImpossible::UNKNOWN);
        };

        let output = self.predicted[uid * self.n_items + iid];
        if output < MIN_VALID_OUTPUT {
            return Err(PredictionImpossible {
                reason: "no valid prediction exists",
            });
        }
        Ok(output * self.scale_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Rating, RatingScale};
    use rand::SeedableRng;

    fn trainset() -> Arc<TrainSet> {
        let mut ratings = Vec::new();
        for user in 1..=12u32 {
            for movie in 1..=6u32 {
                if (user + movie) % 4 == 0 {
                    continue;
                }
                let rating = if movie <= 3 { 5.0 } else { 2.0 };
                ratings.push(Rating::new(user, movie, rating));
            }
        }
        Arc::new(TrainSet::from_ratings(&ratings, RatingScale::MOVIELENS))
    }

    #[test]
    fn test_rmsprop_step_moves_against_gradient() {
        let var = Var::new(&[2.0f32, -3.0], &Device::Cpu).unwrap();
        let mut optimizer = RmsProp::new(
            vec![var.clone()],
            ParamsRmsProp {
                learning_rate: 0.1,
                ..Default::default()
            },
        )
        .unwrap();

        // d(sum(x^2))/dx = 2x; the first step has magnitude lr / sqrt(1 - rho)
        let loss = var.sqr().unwrap().sum_all().unwrap();
        optimizer.backward_step(&loss).unwrap();

        let after = var.as_tensor().to_vec1::<f32>().unwrap();
        let step = 0.1 / (0.1f32).sqrt();
        assert!((after[0] - (2.0 - step)).abs() < 1e-4, "{:?}", after);
        assert!((after[1] - (-3.0 + step)).abs() < 1e-4, "{:?}", after);
    }

    #[test]
    fn test_training_reduces_reconstruction_error() {
        let mut rng = StdRng::seed_from_u64(2);
        let device = Device::Cpu;
        let trainset = trainset();
        let inputs: Vec<SparseRow> = (0..trainset.n_users())
            .map(|u| trainset.user_ratings(u).iter().map(|&(i, r)| (i, r / 5.0)).collect())
            .collect();
        let x = dense_batch(&inputs, trainset.n_items(), &device).unwrap();

        let network = Network::new(trainset.n_items(), 4, &mut rng, &device).unwrap();
        let mut optimizer = RmsProp::new(
            network.vars(),
            ParamsRmsProp {
                learning_rate: 0.01,
                ..Default::default()
            },
        )
        .unwrap();

        let before = network.loss(&x).unwrap().to_scalar::<f32>().unwrap();
        for _ in 0..200 {
            optimizer.backward_step(&network.loss(&x).unwrap()).unwrap();
        }
        let after = network.loss(&x).unwrap().to_scalar::<f32>().unwrap();

        assert!(after < before, "loss went from {} to {}", before, after);
    }

    #[test]
    fn test_dense_batch_fills_rated_cells() {
        let rows: Vec<SparseRow> = vec![vec![(0, 1.0), (2, 0.4)], vec![(1, 0.6)]];
        let x = dense_batch(&rows, 3, &Device::Cpu).unwrap();
        assert_eq!(
            x.to_vec2::<f32>().unwrap(),
            vec![vec![1.0, 0.0, 0.4], vec![0.0, 0.6, 0.0]]
        );
    }

    #[test]
    fn test_same_seed_same_model() {
        let algo = AutoRec::new().with_epochs(5).with_hidden_dimensions(4).with_batch_size(5);
        let mut a = algo.fit(trainset(), &mut StdRng::seed_from_u64(9)).unwrap();
        let mut b = algo.fit(trainset(), &mut StdRng::seed_from_u64(9)).unwrap();
        for movie in 1..=6 {
            assert_eq!(
                a.predict(2, movie, None).unwrap(),
                b.predict(2, movie, None).unwrap()
            );
        }
    }

    #[test]
    fn test_fit_and_predict() {
        let algo = AutoRec::new().with_epochs(30).with_hidden_dimensions(4).with_batch_size(4);
        let mut model = algo.fit(trainset(), &mut StdRng::seed_from_u64(3)).unwrap();

        let p = model.predict(1, 3, None).unwrap();
        assert!((1.0..=5.0).contains(&p.estimate));
        assert!(model.predict(1, 99, None).unwrap().was_impossible);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(AutoRec::new().with_batch_size(0).fit(trainset(), &mut rng).is_err());
        assert!(AutoRec::new().with_hidden_dimensions(0).fit(trainset(), &mut rng).is_err());
    }
}
