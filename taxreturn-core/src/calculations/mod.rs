//! Tax computation engines.
//!
//! Every engine is a function of its inputs and the year's
//! [`TaxYearConfig`](crate::models::TaxYearConfig); each returns a result that
//! carries its own form lines. [`calculate_return`] sequences them into a
//! complete Form 1040.

pub mod brackets;
pub mod common;
pub mod estimated;
pub mod forms;
pub mod optimization;
pub mod return_calc;
pub mod schedules;

pub use brackets::{
    PreferentialRateInput, PreferentialRateResult, marginal_rate, net_capital_gain,
    preferential_rate_tax, progressive_tax,
};
pub use estimated::{
    EstimatedTaxInput, EstimatedTaxPlan, EstimatedTaxPlanner, QuarterlyPayment, SafeHarbor,
};
pub use forms::*;
pub use optimization::{
    FeieComparison, Recommendation, ScenarioTaxes, compare_feie_scenarios,
    generate_recommendations,
};
pub use return_calc::{
    EffectiveRates, Form1040Result, NEC_BUSINESS_NAME, ReturnError, calculate_return,
};
pub use schedules::*;
