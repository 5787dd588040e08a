//! Permutation significance test for inheritance-model fit.
//!
//! The null hypothesis is that phenotypes are distributed over the family
//! structure with no regard to the inheritance model. The test repeatedly
//! reshuffles phenotypes across the same pedigree structure, estimates each
//! randomized pedigree's fit, and counts how often a random fit matches or
//! exceeds the observed one. The p-value applies the standard "+1/+1"
//! continuity correction, counting the observed pedigree as one more trial
//! at least as extreme as itself.
//!
//! Simulations are embarrassingly parallel: workers share the original
//! pedigree read-only, and each one owns a private random stream derived
//! from the base seed and its worker index, so results are reproducible and
//! combine by plain summation. An error in any worker aborts the whole run
//! rather than under-counting into a biased p-value.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{MendelError, Result};
use crate::fit::FitEstimator;
use crate::model::InheritanceModel;
use crate::pedigree::{Pedigree, Phenotype};

/// Multiplicative stream separation for per-worker RNG seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Structural copy of `pedigree` with each phenotype independently resampled
/// uniformly from {Healthy, Affected}.
///
/// Ids, sexes, and parent links are preserved; the original phenotypes are
/// ignored. This is the null-hypothesis generator of the permutation test.
pub fn randomize_phenotypes(pedigree: &Pedigree, rng: &mut impl Rng) -> Pedigree {
    let phenotypes: Vec<Phenotype> = (0..pedigree.len())
        .map(|_| {
            *Phenotype::ALL
                .choose(rng)
                .expect("phenotype set is non-empty")
        })
        .collect();
    pedigree.with_phenotypes(&phenotypes)
}

/// Configuration for the permutation test.
///
/// # Example
///
/// ```ignore
/// use mendel_core::{InheritanceModel, PermutationTest};
///
/// let result = PermutationTest::new(10_000)
///     .trials(1000)
///     .seed(42)
///     .run(&pedigree, InheritanceModel::AutosomalRecessive)?;
/// println!("{}", result.summary());
/// ```
#[derive(Debug, Clone)]
pub struct PermutationTest {
    /// Number of randomized pedigrees to simulate.
    num_simulations: usize,
    /// Trials per fit estimation (observed and randomized alike).
    trials: usize,
    /// Base random seed.
    seed: u64,
    /// Worker count override; defaults to the rayon pool size.
    workers: Option<usize>,
}

/// Results of a permutation test.
#[derive(Debug, Clone)]
pub struct PermutationResult {
    /// Continuity-corrected p-value, `(count_ge + 1) / (simulations + 1)`.
    pub p_value: f64,
    /// Fit fraction of the observed pedigree.
    pub observed_fit: f64,
    /// Randomized pedigrees whose fit matched or exceeded the observed fit.
    pub count_at_or_above: usize,
    /// Simulations actually run (always equals the requested count).
    pub simulations_run: usize,
    /// Trials per fit estimation.
    pub trials_per_simulation: usize,
    /// Model under test.
    pub model: InheritanceModel,
}

impl PermutationTest {
    /// Create a test running the given number of randomized simulations.
    pub fn new(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            trials: 1000,
            seed: 0,
            workers: None,
        }
    }

    /// Set the number of trials per fit estimation (default: 1000).
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Set the base random seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the number of parallel workers.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Run the permutation test of `model` on `pedigree`.
    ///
    /// The requested simulation count is split across workers with the
    /// remainder distributed one-per-worker, so the full count is always
    /// run; no simulations are silently dropped on uneven division.
    ///
    /// # Errors
    /// Returns [`MendelError::InvalidParameter`] if the simulation count,
    /// trial count, or an explicit worker count is zero, and propagates any
    /// structural or model-table error from the simulations.
    pub fn run(&self, pedigree: &Pedigree, model: InheritanceModel) -> Result<PermutationResult> {
        if self.num_simulations == 0 {
            return Err(MendelError::InvalidParameter(
                "num_simulations must be >= 1".to_string(),
            ));
        }
        if self.trials == 0 {
            return Err(MendelError::InvalidParameter(
                "trials must be >= 1".to_string(),
            ));
        }
        let workers = match self.workers {
            Some(0) => {
                return Err(MendelError::InvalidParameter(
                    "workers must be >= 1".to_string(),
                ))
            }
            Some(w) => w,
            None => rayon::current_num_threads().max(1),
        };

        let estimator = FitEstimator::new(self.trials);

        let mut observed_rng = StdRng::seed_from_u64(self.seed);
        let observed_fit = estimator.estimate(pedigree, model, &mut observed_rng)?.fraction;

        let base_chunk = self.num_simulations / workers;
        let remainder = self.num_simulations % workers;

        let count_at_or_above: usize = (0..workers)
            .into_par_iter()
            .map(|worker| -> Result<usize> {
                let chunk = base_chunk + usize::from(worker < remainder);
                let mut rng = StdRng::seed_from_u64(
                    self.seed
                        .wrapping_add((worker as u64 + 1).wrapping_mul(SEED_STRIDE)),
                );

                let mut count = 0usize;
                for _ in 0..chunk {
                    let randomized = randomize_phenotypes(pedigree, &mut rng);
                    let random_fit = estimator.estimate(&randomized, model, &mut rng)?.fraction;
                    // Non-strict: exact ties are at least as extreme.
                    if random_fit >= observed_fit {
                        count += 1;
                    }
                }
                Ok(count)
            })
            .collect::<Result<Vec<usize>>>()?
            .into_iter()
            .sum();

        let p_value =
            (count_at_or_above + 1) as f64 / (self.num_simulations + 1) as f64;

        Ok(PermutationResult {
            p_value,
            observed_fit,
            count_at_or_above,
            simulations_run: self.num_simulations,
            trials_per_simulation: self.trials,
            model,
        })
    }
}

impl PermutationResult {
    /// Print a formatted summary of the permutation test.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("=== Permutation Test ===\n\n");
        s.push_str(&format!(
            "Model:                {} ({})\n",
            self.model.name(),
            self.model.code()
        ));
        s.push_str(&format!(
            "Simulations:          {} x {} trials\n",
            self.simulations_run, self.trials_per_simulation
        ));
        s.push_str(&format!("Observed fit:         {:.4}\n", self.observed_fit));
        s.push_str(&format!(
            "At or above observed: {}\n",
            self.count_at_or_above
        ));
        s.push_str(&format!("p-value:              {:.6}\n", self.p_value));

        s
    }
}
