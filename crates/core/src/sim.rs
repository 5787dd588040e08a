//! Single-trial inheritance simulation.
//!
//! A trial runs in three passes over the pedigree, in traversal order:
//!
//! 1. [`assign_priors`] samples a phenotype-consistent genotype for every
//!    member from the model's forward table.
//! 2. [`propagate`] overwrites every non-founder's genotype by drawing one
//!    allele from each parent (mother's allele first).
//! 3. [`score_consistency`] checks that every member's simulated genotype
//!    maps back to the observed phenotype (all-or-nothing).
//!
//! Simulated genotypes live in a [`GenotypeScratch`] buffer keyed by member
//! index, reset at the start of every trial. The pedigree itself is never
//! mutated, which is what lets the permutation test share one pedigree
//! across parallel workers.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{MendelError, Result};
use crate::model::InheritanceModel;
use crate::pedigree::{Pedigree, Sex};

/// Per-trial genotype buffer, one slot per pedigree member.
///
/// Allocate once and reuse across trials; [`assign_priors`] clears and
/// refills every slot, so no state leaks between trials.
#[derive(Debug, Default)]
pub struct GenotypeScratch {
    slots: Vec<String>,
}

impl GenotypeScratch {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Simulated genotype of member `index`, empty until assigned.
    pub fn genotype(&self, index: usize) -> &str {
        &self.slots[index]
    }

    fn reset(&mut self, len: usize) {
        self.slots.iter_mut().for_each(String::clear);
        self.slots.resize_with(len, String::new);
    }

    fn set(&mut self, index: usize, genotype: &str) {
        self.slots[index].clear();
        self.slots[index].push_str(genotype);
    }
}

/// Assign a phenotype-conditioned genotype prior to every pedigree member.
///
/// Samples uniformly from `model.genotypes_for(phenotype)` for each member
/// in traversal order. Applied to everyone, not just founders; non-founders
/// are overwritten afterwards by [`propagate`].
pub fn assign_priors(
    pedigree: &Pedigree,
    model: InheritanceModel,
    scratch: &mut GenotypeScratch,
    rng: &mut impl Rng,
) {
    scratch.reset(pedigree.len());
    for (i, person) in pedigree.iter().enumerate() {
        let choices = model.genotypes_for(person.phenotype());
        // Forward tables are never empty, so the sample always succeeds.
        let genotype = choices
            .choose(rng)
            .expect("model forward table has at least one genotype");
        scratch.set(i, genotype);
    }
}

/// Propagate genotypes from parents to children.
///
/// For the autosomal models, each child receives one allele drawn uniformly
/// from the mother's genotype and one from the father's, concatenated
/// mother-first. For the Y-linked model, a son copies the father's single
/// allele and a daughter carries `-`.
///
/// # Errors
/// Returns a structural error if a parent's genotype slot is empty. That can
/// only happen when [`assign_priors`] was skipped or the pedigree violates
/// its parents-before-children ordering, so it is a fatal internal fault,
/// not a recoverable data condition.
pub fn propagate(
    pedigree: &Pedigree,
    model: InheritanceModel,
    scratch: &mut GenotypeScratch,
    rng: &mut impl Rng,
) -> Result<()> {
    for i in 0..pedigree.len() {
        let person = pedigree.person(i);
        let (father, mother) = match (person.father(), person.mother()) {
            (Some(f), Some(m)) => (f, m),
            _ => continue,
        };

        if model.is_y_linked() {
            let inherited = match person.sex() {
                Sex::Male => {
                    let paternal = scratch.genotype(father);
                    if paternal.is_empty() {
                        return Err(propagation_order_error(pedigree, i, father));
                    }
                    paternal.to_string()
                }
                Sex::Female => "-".to_string(),
            };
            scratch.set(i, &inherited);
        } else {
            let maternal = sample_allele(scratch.genotype(mother), rng)
                .ok_or_else(|| propagation_order_error(pedigree, i, mother))?;
            let paternal = sample_allele(scratch.genotype(father), rng)
                .ok_or_else(|| propagation_order_error(pedigree, i, father))?;
            let genotype: String = [maternal, paternal].iter().collect();
            scratch.set(i, &genotype);
        }
    }
    Ok(())
}

/// Check every member's simulated genotype against the observed phenotype.
///
/// Returns `true` only if the reverse table maps each genotype to the
/// member's recorded phenotype; a single mismatch invalidates the trial.
///
/// # Errors
/// Returns [`MendelError::ModelMismatch`] if a genotype is absent from the
/// reverse table, which signals a corrupted model definition.
pub fn score_consistency(
    pedigree: &Pedigree,
    model: InheritanceModel,
    scratch: &GenotypeScratch,
) -> Result<bool> {
    for (i, person) in pedigree.iter().enumerate() {
        let genotype = scratch.genotype(i);
        let implied = model
            .phenotype_of(genotype)
            .ok_or_else(|| MendelError::ModelMismatch {
                genotype: genotype.to_string(),
                model: model.code(),
            })?;
        if implied != person.phenotype() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Run one complete trial: priors, propagation, scoring.
pub fn run_trial(
    pedigree: &Pedigree,
    model: InheritanceModel,
    scratch: &mut GenotypeScratch,
    rng: &mut impl Rng,
) -> Result<bool> {
    assign_priors(pedigree, model, scratch, rng);
    propagate(pedigree, model, scratch, rng)?;
    score_consistency(pedigree, model, scratch)
}

/// Draw one allele uniformly from a genotype string, or `None` if empty.
fn sample_allele(genotype: &str, rng: &mut impl Rng) -> Option<char> {
    genotype.as_bytes().choose(rng).map(|&b| b as char)
}

fn propagation_order_error(pedigree: &Pedigree, child: usize, parent: usize) -> MendelError {
    MendelError::Pedigree(format!(
        "Propagation reached person {} before parent at index {} had a genotype (traversal-order bug)",
        pedigree.person(child).id(),
        parent
    ))
}
