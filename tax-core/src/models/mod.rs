mod tax_bracket;
mod tax_calculation;

pub use tax_bracket::{BracketSetError, TaxBracket, TaxBracketSet};
pub use tax_calculation::{TaxCalculationResult, TaxDetail};
