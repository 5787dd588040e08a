use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{MendelError, Result};

/// Biological sex of a pedigree member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Parse a sex code from pedigree input (`"F"` or `"M"`, case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "F" | "f" => Ok(Sex::Female),
            "M" | "m" => Ok(Sex::Male),
            other => Err(MendelError::Pedigree(format!(
                "Unknown sex code '{}' (expected 'F' or 'M')",
                other
            ))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "Female"),
            Sex::Male => write!(f, "Male"),
        }
    }
}

/// Observed health status of a pedigree member, treated as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phenotype {
    Healthy,
    Affected,
}

impl Phenotype {
    /// Parse a status code from pedigree input (`"H"` or `"A"`, case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "H" | "h" => Ok(Phenotype::Healthy),
            "A" | "a" => Ok(Phenotype::Affected),
            other => Err(MendelError::Pedigree(format!(
                "Unknown status code '{}' (expected 'H' or 'A')",
                other
            ))),
        }
    }

    /// Both phenotype values, used when resampling phenotypes uniformly.
    pub const ALL: [Phenotype; 2] = [Phenotype::Healthy, Phenotype::Affected];
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phenotype::Healthy => write!(f, "Healthy"),
            Phenotype::Affected => write!(f, "Affected"),
        }
    }
}

/// A single pedigree member.
///
/// Parent links are 0-based positional indices into the owning [`Pedigree`].
/// The pedigree's insertion order guarantees that parents always precede
/// their children, so parent indices are strictly smaller than the member's
/// own index. Simulated genotypes are not stored here; they live in a
/// per-trial scratch buffer keyed by position (see [`crate::sim`]).
#[derive(Debug, Clone)]
pub struct Person {
    /// Identifier carried through from the input data.
    id: u32,
    /// Biological sex.
    sex: Sex,
    /// Observed phenotype.
    phenotype: Phenotype,
    /// Index of the father, or `None` for a founder.
    father: Option<usize>,
    /// Index of the mother, or `None` for a founder.
    mother: Option<usize>,
}

impl Person {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn phenotype(&self) -> Phenotype {
        self.phenotype
    }

    /// Index of the father in the owning pedigree, or `None` if unrecorded.
    pub fn father(&self) -> Option<usize> {
        self.father
    }

    /// Index of the mother in the owning pedigree, or `None` if unrecorded.
    pub fn mother(&self) -> Option<usize> {
        self.mother
    }

    /// Whether this member has no recorded parents.
    pub fn is_founder(&self) -> bool {
        self.father.is_none()
    }

    /// Identity triple used for duplicate detection and assignment dedup.
    /// Parent links and simulated genotypes are deliberately excluded.
    pub fn signature(&self) -> (u32, Sex, Phenotype) {
        (self.id, self.sex, self.phenotype)
    }
}

/// An observed family pedigree: an ordered list of members where parents
/// always appear before their children.
///
/// Structure and phenotypes are fixed at construction; the simulation layers
/// never mutate a pedigree, they only read it while writing genotypes into
/// external scratch buffers.
///
/// Invariants enforced by every constructor:
/// - no two members share the same (id, sex, phenotype) signature;
/// - parent links reference already-inserted positions (no forward or self
///   references);
/// - parentage is all-or-nothing: father and mother are both recorded or
///   both absent.
#[derive(Debug, Clone)]
pub struct Pedigree {
    members: Vec<Person>,
}

/// One row of bulk pedigree input: (id, sex, phenotype, father, mother),
/// with parents given as positional indices.
pub type PersonRecord = (u32, Sex, Phenotype, Option<usize>, Option<usize>);

impl Pedigree {
    /// Create an empty pedigree.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn person(&self, index: usize) -> &Person {
        &self.members[index]
    }

    /// Iterate over members in traversal order (parents before children).
    pub fn iter(&self) -> std::slice::Iter<'_, Person> {
        self.members.iter()
    }

    /// Append a member to the pedigree.
    ///
    /// # Errors
    /// Returns an error if the (id, sex, phenotype) signature already exists,
    /// if exactly one parent is given, or if a parent index does not
    /// reference an already-inserted member.
    pub fn add_person(
        &mut self,
        id: u32,
        sex: Sex,
        phenotype: Phenotype,
        father: Option<usize>,
        mother: Option<usize>,
    ) -> Result<usize> {
        if father.is_some() != mother.is_some() {
            return Err(MendelError::Pedigree(format!(
                "Person {} has half-specified parentage (father and mother must both be set or both absent)",
                id
            )));
        }

        let index = self.members.len();
        for parent in [father, mother].into_iter().flatten() {
            if parent >= index {
                return Err(MendelError::Pedigree(format!(
                    "Person {} references parent index {} which is not yet in the pedigree",
                    id, parent
                )));
            }
        }

        let candidate = Person {
            id,
            sex,
            phenotype,
            father,
            mother,
        };
        if self
            .members
            .iter()
            .any(|p| p.signature() == candidate.signature())
        {
            return Err(MendelError::Pedigree(format!(
                "Duplicate person: id={} sex={} phenotype={} already in the pedigree",
                id, sex, phenotype
            )));
        }

        self.members.push(candidate);
        Ok(index)
    }

    /// Build a pedigree from (id, sex, phenotype, father, mother) records.
    ///
    /// Records must be ordered with parents before children.
    ///
    /// # Errors
    /// Returns an error on duplicate signatures, half-specified parentage,
    /// or forward parent references.
    pub fn from_records(records: &[PersonRecord]) -> Result<Self> {
        let mut ped = Self::new();
        for &(id, sex, phenotype, father, mother) in records {
            ped.add_person(id, sex, phenotype, father, mother)?;
        }
        Ok(ped)
    }

    /// Read a pedigree from a CSV file.
    ///
    /// Expected columns (header required): `id`, `sex`, `status`, `father`,
    /// `mother`. Sex is `F`/`M`, status is `H`/`A`. Parents are positional
    /// indices of earlier rows; unknown parents are coded as `N`, `NA`, or
    /// an empty field.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, columns are missing, a
    /// field fails to parse, or any pedigree invariant is violated.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();

        let column = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                MendelError::Pedigree(format!("CSV missing '{}' column", name))
            })
        };
        let id_col = column("id")?;
        let sex_col = column("sex")?;
        let status_col = column("status")?;
        let father_col = column("father")?;
        let mother_col = column("mother")?;

        let field = |record: &csv::StringRecord, col: usize, name: &str| -> Result<String> {
            record
                .get(col)
                .map(|s| s.to_string())
                .ok_or_else(|| MendelError::Pedigree(format!("Missing {} field in row", name)))
        };

        let mut ped = Self::new();
        for result in reader.records() {
            let record = result?;

            let id_raw = field(&record, id_col, "id")?;
            let id: u32 = id_raw.parse().map_err(|_| {
                MendelError::Pedigree(format!("Invalid person id '{}'", id_raw))
            })?;
            let sex = Sex::parse(&field(&record, sex_col, "sex")?)?;
            let phenotype = Phenotype::parse(&field(&record, status_col, "status")?)?;
            let father = parse_parent(&field(&record, father_col, "father")?)?;
            let mother = parse_parent(&field(&record, mother_col, "mother")?)?;

            ped.add_person(id, sex, phenotype, father, mother)?;
        }

        Ok(ped)
    }

    /// Structural copy of this pedigree with replacement phenotypes.
    ///
    /// Ids, sexes, and parent links are preserved; `phenotypes[i]` becomes
    /// the phenotype of member `i`. Used by the permutation test's
    /// null-hypothesis generator.
    ///
    /// # Panics
    /// Panics if `phenotypes.len() != self.len()`; callers always derive the
    /// replacement vector from this pedigree.
    pub(crate) fn with_phenotypes(&self, phenotypes: &[Phenotype]) -> Self {
        assert_eq!(phenotypes.len(), self.members.len());
        let members = self
            .members
            .iter()
            .zip(phenotypes)
            .map(|(p, &phenotype)| Person { phenotype, ..p.clone() })
            .collect();
        Self { members }
    }

    /// Map from person id to position, for presentation layers that report
    /// per-individual results.
    pub fn index_by_id(&self) -> HashMap<u32, usize> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect()
    }
}

impl Default for Pedigree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Pedigree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.members.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {} {}", p.id, p.sex, p.phenotype)?;
        }
        Ok(())
    }
}

/// Parse a parent field, returning `None` for unknown parents.
///
/// Unknown parents are coded as `"N"`, `"NA"`, or an empty field.
fn parse_parent(s: &str) -> Result<Option<usize>> {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("n")
        || trimmed.eq_ignore_ascii_case("na")
    {
        return Ok(None);
    }
    trimmed.parse::<usize>().map(Some).map_err(|_| {
        MendelError::Pedigree(format!("Invalid parent index '{}'", trimmed))
    })
}
