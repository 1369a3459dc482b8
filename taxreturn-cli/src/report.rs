use serde::Serialize;
use taxreturn_core::calculations::{
    EffectiveRates, EstimatedTaxInput, EstimatedTaxPlan, EstimatedTaxPlanner, Recommendation,
    generate_recommendations,
};
use taxreturn_core::{
    ColoradoForm104Result, Form1040Result, ReturnError, TaxYearConfig, TaxpayerProfile,
    calculate_full_return,
};
use tracing::debug;

/// Everything printed for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub taxpayer: String,
    pub federal: Form1040Result,
    pub effective_rates: Option<EffectiveRates>,
    pub colorado: Option<ColoradoForm104Result>,
    /// Estimated payments for the following year, based on this return.
    pub estimated_plan: EstimatedTaxPlan,
    pub recommendations: Vec<Recommendation>,
}

impl Report {
    pub fn build(
        profile: &TaxpayerProfile,
        config: &TaxYearConfig,
    ) -> Result<Self, ReturnError> {
        let full = calculate_full_return(profile, config)?;
        let federal = full.federal;

        let estimated_plan = EstimatedTaxPlanner::new(&config.estimated_tax).plan(
            &EstimatedTaxInput {
                total_tax: federal.total_tax,
                refundable_credits: federal.refundable_credits,
                prior_year_tax: profile.prior_year_tax,
                agi: federal.agi,
                withholding: federal.withholding,
            },
            profile.filing_status,
        );
        let recommendations = generate_recommendations(&federal, profile, config);
        debug!(
            recommendations = recommendations.len(),
            payments_required = estimated_plan.estimated_payments_required,
            "Report assembled"
        );

        Ok(Self {
            taxpayer: profile.full_name(),
            effective_rates: federal.effective_rates(),
            federal,
            colorado: full.colorado,
            estimated_plan,
            recommendations,
        })
    }
}
