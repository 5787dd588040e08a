pub mod error;
pub mod fit;
pub mod model;
pub mod pedigree;
pub mod permutation;
pub mod sim;

pub use error::{MendelError, Result};
pub use fit::{AssignedPerson, FitEstimate, FitEstimator, GenotypeAssignment};
pub use model::InheritanceModel;
pub use pedigree::{Pedigree, Person, Phenotype, Sex};
pub use permutation::{randomize_phenotypes, PermutationResult, PermutationTest};
pub use sim::GenotypeScratch;
