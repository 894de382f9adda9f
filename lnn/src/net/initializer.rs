use crate::dtype::DType;
use rand::SeedableRng;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand_distr::Uniform;

/// Supplies the starting weights of each cell in a [`Layer`](super::Layer).
pub trait LayerInitializer<T: DType> {
    fn get_weights(&mut self, cell_idx: usize, input_size: usize) -> Vec<T>;
}

/// Draws every weight independently from a uniform distribution over [0, 1).
pub struct RandomInitializer {
    rng: StdRng,
}

impl RandomInitializer {
    pub fn seed_from_u64(seed: u64) -> Self {
        RandomInitializer {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_rng(rng: StdRng) -> Self {
        RandomInitializer { rng }
    }
}

impl Default for RandomInitializer {
    fn default() -> Self {
        RandomInitializer {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<T: DType> LayerInitializer<T> for RandomInitializer {
    fn get_weights(&mut self, _cell_idx: usize, input_size: usize) -> Vec<T> {
        let dist = Uniform::new(0.0f64, 1.0f64);
        dist.sample_iter(&mut self.rng)
            .take(input_size)
            .map(T::from_f64)
            .collect()
    }
}

/// Sets every weight to the same value. Trains about as well as random initialization.
#[derive(Copy, Clone, Debug)]
pub struct ConstantInitializer<T>(pub T);

impl<T: DType> LayerInitializer<T> for ConstantInitializer<T> {
    fn get_weights(&mut self, _cell_idx: usize, input_size: usize) -> Vec<T> {
        vec![self.0; input_size]
    }
}
