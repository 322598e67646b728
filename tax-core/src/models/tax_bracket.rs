use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One marginal-rate band of a progressive schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive floor of the band.
    pub min_income: Decimal,
    /// Ceiling of the band, `None` for the top bracket.
    pub max_income: Option<Decimal>,
    /// Marginal rate as a fraction (`0.205` for 20.5%).
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            tax_rate,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_income.is_none()
    }
}

/// Reasons a bracket schedule can be rejected by [`TaxBracketSet::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BracketSetError {
    #[error("tax year {0} has no brackets")]
    Empty(i32),

    #[error("bracket {index} has a negative lower bound {min_income}")]
    NegativeLowerBound { index: usize, min_income: Decimal },

    #[error("bracket {index} has rate {rate} outside [0, 1]")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("bracket {index} starts at {found} but the previous bracket ends at {expected}")]
    NotContiguous {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("bracket {index} has an upper bound {max_income} not above its lower bound {min_income}")]
    EmptyBand {
        index: usize,
        min_income: Decimal,
        max_income: Decimal,
    },

    #[error("only the last bracket may be unbounded (bracket {0} is unbounded)")]
    UnboundedNotLast(usize),

    #[error("the last bracket must be unbounded")]
    MissingUnbounded,
}

/// The ordered bracket schedule of a single tax year.
///
/// Clones share the same storage; a set is never mutated after it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxBracketSet {
    tax_year: i32,
    brackets: Arc<[TaxBracket]>,
}

impl TaxBracketSet {
    /// Wraps `brackets` without checking them. Use [`validate`](Self::validate)
    /// when the data comes from outside the process.
    pub fn new(
        tax_year: i32,
        brackets: Vec<TaxBracket>,
    ) -> Self {
        Self {
            tax_year,
            brackets: brackets.into(),
        }
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Checks that the brackets ascend contiguously from a non-negative floor,
    /// carry rates in `[0, 1]`, and end in exactly one unbounded bracket.
    pub fn validate(&self) -> Result<(), BracketSetError> {
        let last = match self.brackets.len() {
            0 => return Err(BracketSetError::Empty(self.tax_year)),
            n => n - 1,
        };

        let mut previous_max: Option<Decimal> = None;
        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.min_income < Decimal::ZERO {
                return Err(BracketSetError::NegativeLowerBound {
                    index,
                    min_income: bracket.min_income,
                });
            }
            if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
                return Err(BracketSetError::RateOutOfRange {
                    index,
                    rate: bracket.tax_rate,
                });
            }
            if let Some(expected) = previous_max {
                if bracket.min_income != expected {
                    return Err(BracketSetError::NotContiguous {
                        index,
                        expected,
                        found: bracket.min_income,
                    });
                }
            }
            match bracket.max_income {
                Some(max_income) if max_income <= bracket.min_income => {
                    return Err(BracketSetError::EmptyBand {
                        index,
                        min_income: bracket.min_income,
                        max_income,
                    });
                }
                Some(max_income) => previous_max = Some(max_income),
                None if index != last => return Err(BracketSetError::UnboundedNotLast(index)),
                None => {}
            }
        }

        if self.brackets[last].is_unbounded() {
            Ok(())
        } else {
            Err(BracketSetError::MissingUnbounded)
        }
    }
}
