//! Two-level full and fractional factorial designs.
//!
//! ## Full Factorial
//!
//! A 2^k design runs every combination of the low (−1) and high (+1) levels
//! of k factors. Runs are listed in standard order: bit `j` of the run index
//! selects the level of factor `j`, so the first factor alternates fastest.
//!
//! ## Fractional Factorial
//!
//! A 2^(k−p) design starts from a full factorial in `k − p` base factors and
//! adds `p` factors whose columns are products of base columns. Each
//! generator, together with the factor it defines, is a word of the defining
//! relation; the shortest word gives the design resolution.
//!
//! ## Example
//!
//! ```
//! use doe_rsm::design::{fractional_factorial, full_factorial, Generator};
//!
//! let full = full_factorial(3, None).unwrap();
//! assert_eq!(full.runs(), 8);
//!
//! // 2^(4-1) with D = ABC
//! let half = fractional_factorial(3, &[Generator::parse("ABC").unwrap()], None).unwrap();
//! assert_eq!(half.design().runs(), 8);
//! assert_eq!(half.design().factors(), 4);
//! assert_eq!(half.resolution(), Some(4));
//! ```

use ndarray::Array2;
use std::cmp::Reverse;
use std::fmt;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{resolve_names, Design, PointKind, MAX_FACTORS, MIN_FACTORS};
use crate::error::{Error, Result};

/// Check that `k` lies in `MIN_FACTORS..=MAX_FACTORS`.
pub(crate) fn check_factor_count(k: usize) -> Result<()> {
    if !(MIN_FACTORS..=MAX_FACTORS).contains(&k) {
        return Err(Error::InvalidFactorCount {
            factors: k,
            min: MIN_FACTORS,
            max: MAX_FACTORS,
        });
    }
    Ok(())
}

/// Coded ±1 level of factor `j` in standard-order run `i`.
#[inline]
pub(crate) fn standard_level(i: usize, j: usize) -> f64 {
    if (i >> j) & 1 == 1 {
        1.0
    } else {
        -1.0
    }
}

/// Generate a 2^k full factorial design.
///
/// # Arguments
///
/// * `k` - Number of factors, 1 through 10
/// * `names` - Optional factor names; defaults to `A`, `B`, ...
///
/// # Errors
///
/// Returns [`Error::InvalidFactorCount`] when `k` is outside 1..=10 and
/// [`Error::DimensionMismatch`] when the number of names differs from `k`.
///
/// # Example
///
/// ```
/// use doe_rsm::design::full_factorial;
///
/// let design = full_factorial(2, Some(&["Temp", "Time"])).unwrap();
/// assert_eq!(design.runs(), 4);
/// assert_eq!(design.level(1, "Temp").unwrap(), 1.0);
/// assert_eq!(design.level(1, "Time").unwrap(), -1.0);
/// ```
pub fn full_factorial(k: usize, names: Option<&[&str]>) -> Result<Design> {
    check_factor_count(k)?;
    let names = resolve_names(k, names)?;

    let runs = 1usize << k;
    let points = Array2::from_shape_fn((runs, k), |(i, j)| standard_level(i, j));

    debug!(factors = k, runs, "generated full factorial design");
    Ok(Design::from_parts(
        names,
        points,
        vec![PointKind::Factorial; runs],
        None,
    ))
}

/// Defines an added factor as the product of base factor columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Generator {
    columns: Vec<usize>,
}

impl Generator {
    /// Create a generator from base column indices.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two columns are given or a column repeats.
    pub fn new(mut columns: Vec<usize>) -> Result<Self> {
        if columns.len() < 2 {
            return Err(Error::invalid_generator(
                "a generator needs at least two base factors",
            ));
        }
        columns.sort_unstable();
        if columns.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::invalid_generator("generator repeats a base factor"));
        }
        Ok(Self { columns })
    }

    /// Parse a word such as `"ABC"`, where `A` is the first base factor.
    ///
    /// # Errors
    ///
    /// Returns an error for characters outside `A..=J` (case-insensitive) or
    /// for words rejected by [`Generator::new`].
    pub fn parse(word: &str) -> Result<Self> {
        let columns = word
            .trim()
            .chars()
            .map(|c| {
                let upper = c.to_ascii_uppercase();
                if ('A'..='J').contains(&upper) {
                    Ok(upper as usize - 'A' as usize)
                } else {
                    Err(Error::invalid_generator(format!(
                        "'{c}' in '{word}' is not a factor letter A-J"
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Base column indices, ascending.
    #[must_use]
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    fn mask(&self) -> u32 {
        self.columns.iter().fold(0, |m, &c| m | (1 << c))
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in &self.columns {
            write!(f, "{}", char::from(b'A' + c as u8))?;
        }
        Ok(())
    }
}

/// A 2^(k−p) fractional factorial design and its alias structure.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FractionalDesign {
    design: Design,
    generators: Vec<Generator>,
    defining_relation: Vec<Vec<usize>>,
    resolution: Option<usize>,
}

impl FractionalDesign {
    /// The generated design.
    #[must_use]
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Consume and return the design.
    #[must_use]
    pub fn into_design(self) -> Design {
        self.design
    }

    /// Generators, one per added factor.
    #[must_use]
    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Words of the defining relation as factor column indices, shortest first.
    #[must_use]
    pub fn defining_relation(&self) -> &[Vec<usize>] {
        &self.defining_relation
    }

    /// Length of the shortest defining word.
    ///
    /// `None` without generators: the design is a full factorial and has no
    /// defining relation.
    #[must_use]
    pub fn resolution(&self) -> Option<usize> {
        self.resolution
    }

    /// Defining relation with factor names, e.g. `I = ABCD`. Just `I` without generators.
    #[must_use]
    pub fn defining_relation_string(&self) -> String {
        if self.defining_relation.is_empty() {
            return "I".to_string();
        }
        let names = self.design.factor_names();
        let sep = if names.iter().all(|n| n.chars().count() == 1) {
            ""
        } else {
            "*"
        };
        let words: Vec<String> = self
            .defining_relation
            .iter()
            .map(|w| {
                w.iter()
                    .map(|&c| names[c].as_str())
                    .collect::<Vec<_>>()
                    .join(sep)
            })
            .collect();
        format!("I = {}", words.join(" = "))
    }
}

/// Generate a 2^(k−p) fractional factorial design.
///
/// # Arguments
///
/// * `base` - Number of base factors (the full factorial part)
/// * `generators` - One generator per added factor
/// * `names` - Optional names for all `base + generators.len()` factors
///
/// # Errors
///
/// Returns an error if the total factor count is outside 1..=10, a generator
/// references a column beyond the base factors, or two generators coincide.
pub fn fractional_factorial(
    base: usize,
    generators: &[Generator],
    names: Option<&[&str]>,
) -> Result<FractionalDesign> {
    check_factor_count(base)?;
    let k = base + generators.len();
    check_factor_count(k)?;

    for (i, g) in generators.iter().enumerate() {
        if let Some(&c) = g.columns.iter().find(|&&c| c >= base) {
            return Err(Error::invalid_generator(format!(
                "generator {g} references factor {} but only {base} base factors exist",
                c + 1
            )));
        }
        if generators[..i].contains(g) {
            return Err(Error::invalid_generator(format!(
                "generator {g} is given more than once"
            )));
        }
    }

    let names = resolve_names(k, names)?;
    let runs = 1usize << base;
    let points = Array2::from_shape_fn((runs, k), |(i, j)| {
        if j < base {
            standard_level(i, j)
        } else {
            generators[j - base]
                .columns
                .iter()
                .map(|&c| standard_level(i, c))
                .product()
        }
    });

    let words: Vec<u32> = generators
        .iter()
        .enumerate()
        .map(|(i, g)| g.mask() | (1 << (base + i)))
        .collect();
    let defining_relation = defining_relation(&words);
    let resolution = defining_relation.first().map(Vec::len);

    debug!(
        factors = k,
        base,
        runs,
        ?resolution,
        "generated fractional factorial design"
    );

    Ok(FractionalDesign {
        design: Design::from_parts(names, points, vec![PointKind::Factorial; runs], None),
        generators: generators.to_vec(),
        defining_relation,
        resolution,
    })
}

/// Every product of a non-empty subset of generator words.
fn defining_relation(words: &[u32]) -> Vec<Vec<usize>> {
    let p = words.len();
    let mut masks: Vec<u32> = (1u32..(1 << p))
        .map(|subset| {
            words
                .iter()
                .enumerate()
                .filter(|&(i, _)| subset & (1 << i) != 0)
                .fold(0, |acc, (_, &w)| acc ^ w)
        })
        .filter(|&m| m != 0)
        .collect();
    masks.sort_by_key(|&m| (m.count_ones(), Reverse(m.reverse_bits())));
    masks.dedup();

    masks
        .into_iter()
        .map(|m| (0..32).filter(|&c| m & (1 << c) != 0).collect())
        .collect()
}
