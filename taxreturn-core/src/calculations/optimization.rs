//! What-if analysis on a completed return.

use std::cmp::Reverse;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::marginal_rate;
use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::forms::{FeieInput, Form2555Result, evaluate_feie};
use crate::calculations::return_calc::{Form1040Result, ReturnError, calculate_return};
use crate::calculations::schedules::{
    regular_home_office_deduction, simplified_home_office_deduction,
};
use crate::models::{HomeOfficeMethod, TaxYearConfig, TaxpayerProfile};

/// The taxes that differ between FEIE scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioTaxes {
    pub income_tax: Decimal,
    pub se_tax: Decimal,
    pub additional_medicare: Decimal,
    pub niit: Decimal,
    pub total_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeieComparison {
    pub without_feie: ScenarioTaxes,
    pub with_feie: ScenarioTaxes,
    pub evaluation: Form2555Result,
    pub recommendation: String,
}

/// Computes the return and evaluates the exclusion against its Schedule C
/// profit. Only income tax differs between the two scenarios.
pub fn compare_feie_scenarios(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
) -> Result<FeieComparison, ReturnError> {
    let result = calculate_return(profile, config)?;
    let evaluation = feie_for(&result, profile, config);

    let without_feie = ScenarioTaxes {
        income_tax: result.tax,
        se_tax: result.se_tax,
        additional_medicare: result.additional_medicare,
        niit: result.niit,
        total_tax: result.total_tax,
    };
    let with_feie = ScenarioTaxes {
        income_tax: evaluation.tax_with_feie,
        total_tax: non_negative(result.total_tax - evaluation.savings),
        ..without_feie.clone()
    };
    let recommendation = if evaluation.is_beneficial {
        format!(
            "Take the FEIE: saves ${} in income tax",
            evaluation.savings
        )
    } else {
        "Skip the FEIE: not beneficial for this return".to_string()
    };

    Ok(FeieComparison {
        without_feie,
        with_feie,
        evaluation,
        recommendation,
    })
}

fn feie_for(
    result: &Form1040Result,
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
) -> Form2555Result {
    evaluate_feie(
        &FeieInput {
            days_in_foreign_country: profile.foreign_residency.days_in_foreign_country,
            foreign_earned_income: non_negative(schedule_c_profit(result)),
            tax_without_feie: result.tax,
        },
        config.brackets_for(profile.filing_status),
        &config.feie,
    )
}

fn schedule_c_profit(result: &Form1040Result) -> Decimal {
    result
        .schedule_c_results
        .iter()
        .map(|c| c.net_profit_loss)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub estimated_savings: Decimal,
}

/// Suggestions that would lower the tax on `result`, largest savings first.
pub fn generate_recommendations(
    result: &Form1040Result,
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let se_income = schedule_c_profit(result);

    let days = profile.foreign_residency.days_in_foreign_country;
    if days >= config.feie.physical_presence_days && se_income > Decimal::ZERO {
        let feie = feie_for(result, profile, config);
        if feie.is_beneficial {
            recommendations.push(Recommendation {
                title: "Claim the foreign earned income exclusion".to_string(),
                description: format!(
                    "{days} days abroad meets the physical presence test. Up to ${} of \
                     earned income can be excluded from income tax; SE tax is unchanged.",
                    config.feie.exclusion_limit.normalize()
                ),
                estimated_savings: feie.savings,
            });
        }
    }

    let retirement = &config.retirement;
    if se_income > retirement.sep_min_se_income {
        let deductible_se_tax = result
            .schedule_se
            .as_ref()
            .map(|se| se.deductible_se_tax)
            .unwrap_or_default();
        let contribution = round_half_up(
            ((se_income - deductible_se_tax) * retirement.sep_contribution_rate)
                .min(retirement.sep_limit),
        );
        if contribution > Decimal::ZERO {
            let rate = marginal_rate(
                result.taxable_income,
                config.brackets_for(profile.filing_status),
            );
            recommendations.push(Recommendation {
                title: "SEP-IRA contribution".to_string(),
                description: format!(
                    "Contribute up to ${} to a SEP-IRA to reduce taxable income. \
                     The deadline is the filing deadline including extensions.",
                    contribution.round_dp(0)
                ),
                estimated_savings: round_half_up(contribution * rate),
            });
        }
    }

    for business in &profile.businesses {
        let Some(office) = business
            .home_office
            .as_ref()
            .filter(|o| o.method == HomeOfficeMethod::Simplified)
        else {
            continue;
        };
        if office.total_home_sqft.is_zero() || office.office_sqft.is_zero() {
            continue;
        }
        let regular = regular_home_office_deduction(office);
        let simplified = simplified_home_office_deduction(office, &config.business);
        if regular > simplified {
            recommendations.push(Recommendation {
                title: format!("Switch {} to the regular home office method", business.name),
                description: format!(
                    "Regular method deduction ${regular} vs simplified ${simplified}."
                ),
                estimated_savings: regular - simplified,
            });
        }
    }

    recommendations.sort_by_key(|r| Reverse(r.estimated_savings));
    debug!(count = recommendations.len(), "Recommendations generated");
    recommendations
}
