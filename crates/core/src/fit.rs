//! Monte Carlo estimation of how well an inheritance model explains a
//! pedigree.
//!
//! The fit fraction is the probability, estimated over many independent
//! trials, that a random phenotype-consistent genotype assignment survives
//! propagation with every member still consistent. A fraction of 1.0 means
//! the model always explains the pedigree; 0.0 means it never can.

use rand::Rng;

use crate::error::{MendelError, Result};
use crate::model::InheritanceModel;
use crate::pedigree::{Pedigree, Phenotype, Sex};
use crate::sim::{self, GenotypeScratch};

/// Configuration for fit estimation.
///
/// # Example
///
/// ```ignore
/// use mendel_core::{FitEstimator, InheritanceModel};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let estimator = FitEstimator::new(10_000).collect_assignments(true);
/// let estimate = estimator.estimate(&pedigree, InheritanceModel::AutosomalRecessive, &mut rng)?;
/// println!("fit = {:.4}", estimate.fraction);
/// ```
#[derive(Debug, Clone)]
pub struct FitEstimator {
    /// Number of independent trials.
    trials: usize,
    /// Whether to record distinct consistent assignments.
    collect_assignments: bool,
}

/// Result of a fit estimation run.
#[derive(Debug, Clone)]
pub struct FitEstimate {
    /// Fraction of trials in which every member was consistent, in [0, 1].
    pub fraction: f64,
    /// Number of fully consistent trials.
    pub hits: usize,
    /// Number of trials run.
    pub trials: usize,
    /// Distinct consistent assignments, empty unless collection was enabled.
    pub assignments: Vec<GenotypeAssignment>,
}

/// A deep snapshot of the per-member genotypes from one consistent trial.
#[derive(Debug, Clone)]
pub struct GenotypeAssignment {
    entries: Vec<AssignedPerson>,
}

/// One member's slice of a [`GenotypeAssignment`].
#[derive(Debug, Clone)]
pub struct AssignedPerson {
    pub id: u32,
    pub sex: Sex,
    pub phenotype: Phenotype,
    pub genotype: String,
}

impl GenotypeAssignment {
    fn snapshot(pedigree: &Pedigree, scratch: &GenotypeScratch) -> Self {
        let entries = pedigree
            .iter()
            .enumerate()
            .map(|(i, p)| AssignedPerson {
                id: p.id(),
                sex: p.sex(),
                phenotype: p.phenotype(),
                genotype: scratch.genotype(i).to_string(),
            })
            .collect();
        Self { entries }
    }

    /// Members in pedigree traversal order.
    pub fn entries(&self) -> &[AssignedPerson] {
        &self.entries
    }

    /// Positional equality on (id, sex, phenotype) only.
    ///
    /// Genotype values are deliberately excluded: assignments are deduped by
    /// pedigree structure, not by the alleles a trial happened to sample.
    pub fn same_pedigree(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().zip(&other.entries).all(|(a, b)| {
                a.id == b.id && a.sex == b.sex && a.phenotype == b.phenotype
            })
    }
}

impl FitEstimator {
    /// Create an estimator running the given number of trials.
    pub fn new(trials: usize) -> Self {
        Self {
            trials,
            collect_assignments: false,
        }
    }

    /// Record the distinct consistent assignments found across trials.
    pub fn collect_assignments(mut self, collect: bool) -> Self {
        self.collect_assignments = collect;
        self
    }

    /// Estimate the fit fraction of `model` on `pedigree`.
    ///
    /// Runs the configured number of independent trials, each consisting of
    /// prior assignment, propagation, and all-or-nothing scoring. The RNG is
    /// injected so a fixed seed reproduces the exact fraction and assignment
    /// set.
    ///
    /// # Errors
    /// Returns [`MendelError::InvalidParameter`] if `trials` is zero, and
    /// propagates structural or model-table errors from the simulator.
    pub fn estimate(
        &self,
        pedigree: &Pedigree,
        model: InheritanceModel,
        rng: &mut impl Rng,
    ) -> Result<FitEstimate> {
        if self.trials == 0 {
            return Err(MendelError::InvalidParameter(
                "trials must be >= 1".to_string(),
            ));
        }

        let mut scratch = GenotypeScratch::new();
        let mut hits = 0usize;
        let mut assignments: Vec<GenotypeAssignment> = Vec::new();

        for _ in 0..self.trials {
            if !sim::run_trial(pedigree, model, &mut scratch, rng)? {
                continue;
            }
            hits += 1;

            if self.collect_assignments {
                let snapshot = GenotypeAssignment::snapshot(pedigree, &scratch);
                if !assignments.iter().any(|a| a.same_pedigree(&snapshot)) {
                    assignments.push(snapshot);
                }
            }
        }

        Ok(FitEstimate {
            fraction: hits as f64 / self.trials as f64,
            hits,
            trials: self.trials,
            assignments,
        })
    }

    /// [`FitEstimator::estimate`] with a `StdRng` built from `seed`.
    pub fn estimate_seeded(
        &self,
        pedigree: &Pedigree,
        model: InheritanceModel,
        seed: u64,
    ) -> Result<FitEstimate> {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        let mut rng = StdRng::seed_from_u64(seed);
        self.estimate(pedigree, model, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::Phenotype;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_healthy_founders() -> Pedigree {
        Pedigree::from_records(&[
            (1, Sex::Male, Phenotype::Healthy, None, None),
            (2, Sex::Female, Phenotype::Healthy, None, None),
        ])
        .unwrap()
    }

    fn ar_trio_affected_child() -> Pedigree {
        Pedigree::from_records(&[
            (1, Sex::Male, Phenotype::Healthy, None, None),
            (2, Sex::Female, Phenotype::Healthy, None, None),
            (3, Sex::Male, Phenotype::Affected, Some(0), Some(1)),
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_trials_rejected() {
        let ped = two_healthy_founders();
        let mut rng = StdRng::seed_from_u64(0);
        let result = FitEstimator::new(0).estimate(
            &ped,
            InheritanceModel::AutosomalRecessive,
            &mut rng,
        );
        assert!(matches!(result, Err(MendelError::InvalidParameter(_))));
    }

    #[test]
    fn test_single_trial_is_zero_or_one() {
        let ped = ar_trio_affected_child();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let estimate = FitEstimator::new(1)
                .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng)
                .unwrap();
            assert!(
                estimate.fraction == 0.0 || estimate.fraction == 1.0,
                "got {}",
                estimate.fraction
            );
        }
    }

    #[test]
    fn test_unrelated_founders_always_consistent() {
        // Priors are phenotype-conditioned, so founders with no children are
        // consistent in every trial.
        let ped = two_healthy_founders();
        let mut rng = StdRng::seed_from_u64(11);
        let estimate = FitEstimator::new(1000)
            .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng)
            .unwrap();
        assert_eq!(estimate.fraction, 1.0);
        assert_eq!(estimate.hits, 1000);
    }

    #[test]
    fn test_ar_trio_fit_near_analytic_value() {
        // Healthy parents sample from {AA, Aa, aA}; the affected child needs
        // "aa", so each parent must both carry and transmit 'a':
        // (2/3 * 1/2)^2 = 1/9.
        let ped = ar_trio_affected_child();
        let mut rng = StdRng::seed_from_u64(12);
        let estimate = FitEstimator::new(20_000)
            .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng)
            .unwrap();
        assert_abs_diff_eq!(estimate.fraction, 1.0 / 9.0, epsilon = 0.02);
    }

    #[test]
    fn test_impossible_pedigree_fit_is_exactly_zero() {
        // AD healthy founders are always "aa", so an affected child can
        // never be produced.
        let ped = Pedigree::from_records(&[
            (1, Sex::Male, Phenotype::Healthy, None, None),
            (2, Sex::Female, Phenotype::Healthy, None, None),
            (3, Sex::Female, Phenotype::Affected, Some(0), Some(1)),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(13);
        let estimate = FitEstimator::new(5000)
            .estimate(&ped, InheritanceModel::AutosomalDominant, &mut rng)
            .unwrap();
        assert_eq!(estimate.fraction, 0.0);
        assert!(estimate.assignments.is_empty());
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let ped = ar_trio_affected_child();
        let estimator = FitEstimator::new(2000).collect_assignments(true);

        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let a = estimator
            .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng_a)
            .unwrap();
        let b = estimator
            .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng_b)
            .unwrap();

        assert_eq!(a.fraction, b.fraction);
        assert_eq!(a.hits, b.hits);
        assert_eq!(a.assignments.len(), b.assignments.len());
        for (x, y) in a.assignments.iter().zip(&b.assignments) {
            for (ex, ey) in x.entries().iter().zip(y.entries()) {
                assert_eq!(ex.genotype, ey.genotype);
            }
        }
    }

    #[test]
    fn test_assignments_deduped_by_structure_not_genotype() {
        // Every consistent trial of a fixed pedigree shares the same
        // (id, sex, phenotype) triples, so even though the sampled genotypes
        // differ across trials, the set collapses to a single entry.
        let ped = two_healthy_founders();
        let mut rng = StdRng::seed_from_u64(14);
        let estimate = FitEstimator::new(500)
            .collect_assignments(true)
            .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng)
            .unwrap();

        assert_eq!(estimate.hits, 500);
        assert_eq!(estimate.assignments.len(), 1);
    }

    #[test]
    fn test_same_pedigree_ignores_genotypes() {
        let make = |genotype: &str| GenotypeAssignment {
            entries: vec![AssignedPerson {
                id: 1,
                sex: Sex::Male,
                phenotype: Phenotype::Healthy,
                genotype: genotype.to_string(),
            }],
        };
        assert!(make("Aa").same_pedigree(&make("AA")));

        let other = GenotypeAssignment {
            entries: vec![AssignedPerson {
                id: 2,
                sex: Sex::Male,
                phenotype: Phenotype::Healthy,
                genotype: "Aa".to_string(),
            }],
        };
        assert!(!make("Aa").same_pedigree(&other));
    }

    #[test]
    fn test_assignments_not_collected_by_default() {
        let ped = two_healthy_founders();
        let mut rng = StdRng::seed_from_u64(15);
        let estimate = FitEstimator::new(100)
            .estimate(&ped, InheritanceModel::AutosomalRecessive, &mut rng)
            .unwrap();
        assert!(estimate.assignments.is_empty());
        assert_eq!(estimate.fraction, 1.0);
    }
}
