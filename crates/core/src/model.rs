//! Registry of Mendelian inheritance models.
//!
//! Each model is a variant of [`InheritanceModel`] carrying its
//! phenotype-to-genotype table and reverse table as static data, selected by
//! explicit match. The forward table lists every genotype string consistent
//! with a phenotype; the reverse table is its total inverse, mapping every
//! producible genotype back to the single phenotype it implies.
//!
//! Genotypes are short allele strings: two characters for the autosomal
//! models, one for Y-linked (`-` denotes the absence of a Y chromosome).

use crate::pedigree::Phenotype;

/// A Mendelian inheritance model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InheritanceModel {
    AutosomalDominant,
    AutosomalRecessive,
    YLinked,
}

impl InheritanceModel {
    /// All registered models.
    pub const ALL: [InheritanceModel; 3] = [
        InheritanceModel::AutosomalDominant,
        InheritanceModel::AutosomalRecessive,
        InheritanceModel::YLinked,
    ];

    /// Short model code, e.g. `"AD"`.
    pub fn code(&self) -> &'static str {
        match self {
            InheritanceModel::AutosomalDominant => "AD",
            InheritanceModel::AutosomalRecessive => "AR",
            InheritanceModel::YLinked => "YL",
        }
    }

    /// Human-readable model name.
    pub fn name(&self) -> &'static str {
        match self {
            InheritanceModel::AutosomalDominant => "Autosomal dominant inheritance",
            InheritanceModel::AutosomalRecessive => "Autosomal recessive inheritance",
            InheritanceModel::YLinked => "Y-linked inheritance",
        }
    }

    /// Look up a model by its short code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Genotype strings consistent with `phenotype` under this model.
    ///
    /// This is the phenotype-conditioned prior sampled for every member at
    /// the start of a trial.
    pub fn genotypes_for(&self, phenotype: Phenotype) -> &'static [&'static str] {
        match (self, phenotype) {
            (InheritanceModel::AutosomalDominant, Phenotype::Affected) => &["AA", "Aa", "aA"],
            (InheritanceModel::AutosomalDominant, Phenotype::Healthy) => &["aa"],
            (InheritanceModel::AutosomalRecessive, Phenotype::Affected) => &["aa"],
            (InheritanceModel::AutosomalRecessive, Phenotype::Healthy) => &["AA", "Aa", "aA"],
            (InheritanceModel::YLinked, Phenotype::Affected) => &["A", "a"],
            (InheritanceModel::YLinked, Phenotype::Healthy) => &["-"],
        }
    }

    /// The phenotype implied by `genotype`, or `None` if the genotype is not
    /// producible under this model.
    ///
    /// Total over every genotype the forward table or propagation can
    /// produce; a `None` during scoring indicates a corrupted model
    /// definition, not bad pedigree data.
    pub fn phenotype_of(&self, genotype: &str) -> Option<Phenotype> {
        match self {
            InheritanceModel::AutosomalDominant => match genotype {
                "AA" | "Aa" | "aA" => Some(Phenotype::Affected),
                "aa" => Some(Phenotype::Healthy),
                _ => None,
            },
            InheritanceModel::AutosomalRecessive => match genotype {
                "AA" | "Aa" | "aA" => Some(Phenotype::Healthy),
                "aa" => Some(Phenotype::Affected),
                _ => None,
            },
            InheritanceModel::YLinked => match genotype {
                "A" | "a" => Some(Phenotype::Affected),
                "-" => Some(Phenotype::Healthy),
                _ => None,
            },
        }
    }

    /// Whether genotypes are single-allele and transmitted father-to-son
    /// only.
    pub fn is_y_linked(&self) -> bool {
        matches!(self, InheritanceModel::YLinked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_names() {
        assert_eq!(InheritanceModel::AutosomalDominant.code(), "AD");
        assert_eq!(InheritanceModel::AutosomalRecessive.code(), "AR");
        assert_eq!(InheritanceModel::YLinked.code(), "YL");
        for model in InheritanceModel::ALL {
            assert!(!model.name().is_empty());
        }
    }

    #[test]
    fn test_from_code() {
        assert_eq!(
            InheritanceModel::from_code("AD"),
            Some(InheritanceModel::AutosomalDominant)
        );
        assert_eq!(
            InheritanceModel::from_code("ar"),
            Some(InheritanceModel::AutosomalRecessive)
        );
        assert_eq!(
            InheritanceModel::from_code(" yl "),
            Some(InheritanceModel::YLinked)
        );
        assert_eq!(InheritanceModel::from_code("XL"), None);
    }

    #[test]
    fn test_reverse_table_total_over_priors() {
        // Every genotype the prior can produce must have a reverse entry,
        // and it must round-trip to the phenotype it was sampled for.
        for model in InheritanceModel::ALL {
            for phenotype in Phenotype::ALL {
                for genotype in model.genotypes_for(phenotype) {
                    assert_eq!(
                        model.phenotype_of(genotype),
                        Some(phenotype),
                        "model {} genotype {}",
                        model.code(),
                        genotype
                    );
                }
            }
        }
    }

    #[test]
    fn test_reverse_table_total_over_autosomal_offspring() {
        // Propagation concatenates one allele from each parent, so every
        // two-character combination of parental alleles must be mapped.
        for model in [
            InheritanceModel::AutosomalDominant,
            InheritanceModel::AutosomalRecessive,
        ] {
            for a in ['A', 'a'] {
                for b in ['A', 'a'] {
                    let genotype: String = [a, b].iter().collect();
                    assert!(
                        model.phenotype_of(&genotype).is_some(),
                        "model {} missing offspring genotype {}",
                        model.code(),
                        genotype
                    );
                }
            }
        }
    }

    #[test]
    fn test_unknown_genotype_is_none() {
        assert_eq!(InheritanceModel::AutosomalDominant.phenotype_of("zz"), None);
        assert_eq!(InheritanceModel::YLinked.phenotype_of("Aa"), None);
    }
}
