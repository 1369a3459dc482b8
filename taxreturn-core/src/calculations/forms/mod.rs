//! Forms that feed Form 1040 lines 13, 16 and 19 and Schedule 2.

pub mod amt;
pub mod credits;
pub mod feie;
pub mod qbi;
pub mod surtaxes;

pub use amt::{AmtInput, Form6251Result, calculate_amt};
pub use credits::{CreditInput, TaxCreditsResult, calculate_tax_credits};
pub use feie::{FeieInput, Form2555Result, evaluate_feie};
pub use qbi::{Form8995Result, QualifiedBusinessIncome, calculate_qbi_deduction};
pub use surtaxes::{additional_medicare_tax, net_investment_income_tax};
