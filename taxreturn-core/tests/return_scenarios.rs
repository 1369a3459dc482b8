//! End-to-end returns computed from complete taxpayer profiles.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use taxreturn_core::calculations::{
    FeieComparison, compare_feie_scenarios, progressive_tax,
};
use taxreturn_core::{
    Business, BusinessExpenses, Dependent, EstimatedPayment, FilingStatus, Form1040Result,
    Form1099B, Form1099Div, Form1099Int, Form1099Nec, FormW2, HealthInsurance, ReturnError,
    ScheduleK1, TaxYearConfig, TaxpayerProfile, calculate_full_return, calculate_return,
};

fn config() -> TaxYearConfig {
    TaxYearConfig::for_year(2025).expect("2025 tables are built in")
}

fn w2(wages: Decimal) -> FormW2 {
    FormW2 {
        employer_name: "Acme Corp".to_string(),
        wages,
        ss_wages: wages,
        medicare_wages: wages,
        ..FormW2::default()
    }
}

/// MFS filer living abroad with two consulting businesses and a rental
/// partnership interest.
fn mfs_expat() -> TaxpayerProfile {
    let mut profile = TaxpayerProfile::new(FilingStatus::MarriedFilingSeparately);
    profile.first_name = "Alex".to_string();
    profile.last_name = "Rivera".to_string();
    profile.taxpayer_age = 41;
    profile.state = "CO".to_string();
    profile.country = "Portugal".to_string();
    profile.foreign_address = true;
    profile.businesses = vec![
        Business {
            expenses: BusinessExpenses {
                legal_and_professional: dec!(4200),
                supplies: dec!(2000),
                ..BusinessExpenses::default()
            },
            ..Business::from_receipts("Law Consulting", dec!(98000))
        },
        Business {
            expenses: BusinessExpenses {
                legal_and_professional: dec!(1350),
                supplies: dec!(3000),
                ..BusinessExpenses::default()
            },
            ..Business::from_receipts("DocSherpa", dec!(24000))
        },
    ];
    profile.schedule_k1s = vec![ScheduleK1 {
        partnership_name: "Front Range Rentals LLC".to_string(),
        net_rental_income: dec!(-3500),
        interest_income: dec!(150),
        ..ScheduleK1::default()
    }];
    profile.health_insurance = Some(HealthInsurance {
        provider: "Global Health".to_string(),
        total_premiums: dec!(8400),
        months_covered: 12,
    });
    profile.estimated_payments = (1..=4)
        .map(|quarter| EstimatedPayment {
            quarter,
            date_paid: None,
            amount: dec!(8000),
        })
        .collect();
    profile.foreign_residency.days_in_foreign_country = 200;
    profile.colorado.has_filing_obligation = true;
    profile
}

fn assert_return_identities(result: &Form1040Result) {
    assert_eq!(result.agi, result.total_income - result.adjustments);
    assert_eq!(
        result.taxable_income,
        (result.agi - result.deduction - result.qbi_deduction).max(Decimal::ZERO)
    );
    assert!(result.overpayment.is_zero() || result.amount_owed.is_zero());
    assert_eq!(
        result.total_payments - result.total_tax,
        result.overpayment - result.amount_owed
    );
    if let Some(qbi) = &result.qbi {
        assert!(qbi.qbi_deduction >= Decimal::ZERO);
        assert!(qbi.qbi_deduction <= qbi.taxable_income_before_qbi * dec!(0.20));
    }
}

// =============================================================================
// Scenario tests
// =============================================================================

#[test]
fn mfs_rental_loss_is_suspended() {
    let profile = mfs_expat();

    let result = calculate_return(&profile, &config()).unwrap();

    assert_eq!(result.business_income, dec!(111450));
    let schedule_e = result.schedule_e.as_ref().unwrap();
    assert_eq!(schedule_e.net_rental_income, dec!(0));
    assert_eq!(schedule_e.suspended_rental_losses, dec!(3500));
    // K-1 interest routes to line 2b, not Schedule E.
    assert_eq!(result.taxable_interest, dec!(150));
    assert_eq!(schedule_e.total_schedule_e_income, dec!(0));
    assert_eq!(result.estimated_payments, dec!(32000));
    assert_return_identities(&result);
}

#[test]
fn mfs_brackets_tax_twenty_thousand() {
    let mut profile = TaxpayerProfile::new(FilingStatus::MarriedFilingSeparately);
    // 35,750 − 15,750 standard deduction = 20,000
    profile.forms_w2 = vec![w2(dec!(35750))];

    let result = calculate_return(&profile, &config()).unwrap();

    assert_eq!(result.taxable_income, dec!(20000));
    // 11,925 × 10% + 8,075 × 12%
    assert_eq!(result.tax, dec!(2161.50));
    assert_return_identities(&result);
}

#[test]
fn self_employment_tax_on_one_hundred_thousand() {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.forms_1099_nec = vec![Form1099Nec {
        payer_name: "Client LLC".to_string(),
        nonemployee_compensation: dec!(100000),
        ..Form1099Nec::default()
    }];

    let result = calculate_return(&profile, &config()).unwrap();

    let se = result.schedule_se.as_ref().unwrap();
    assert_eq!(se.se_tax, dec!(14129.55));
    assert_eq!(se.deductible_se_tax, dec!(7064.78));
    assert_eq!(result.adjustments, dec!(7064.78));
    assert_eq!(result.schedule_c_results[0].business_name, "1099-NEC Income");
    assert_return_identities(&result);
}

#[test]
fn joint_filers_at_500k_lose_child_credit() {
    let mut profile = TaxpayerProfile::new(FilingStatus::MarriedFilingJointly);
    profile.forms_w2 = vec![w2(dec!(300000)), w2(dec!(200000))];
    profile.dependents = (0..2)
        .map(|_| Dependent {
            relationship: "Child".to_string(),
            is_qualifying_child_ctc: true,
            ..Dependent::default()
        })
        .collect();

    let result = calculate_return(&profile, &config()).unwrap();

    assert_eq!(result.agi, dec!(500000));
    let credits = result.tax_credits.as_ref().unwrap();
    assert!(credits.phaseout_reduction > Decimal::ZERO);
    assert_eq!(credits.phaseout_reduction, dec!(5000));
    assert_eq!(credits.total_credit_after_phaseout, dec!(0));
    assert_return_identities(&result);
}

#[test]
fn foreign_earned_income_exclusion_is_beneficial() {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.businesses = vec![Business::from_receipts("Remote Design", dec!(120000))];
    profile.foreign_residency.days_in_foreign_country = 340;

    let FeieComparison {
        without_feie,
        with_feie,
        evaluation,
        ..
    } = compare_feie_scenarios(&profile, &config()).unwrap();

    assert!(evaluation.qualifies);
    assert!(evaluation.is_beneficial);
    assert!(evaluation.savings > Decimal::ZERO);
    assert_eq!(with_feie.se_tax, without_feie.se_tax);

    let result = calculate_return(&profile, &config()).unwrap();
    assert_eq!(result.feie.as_ref(), Some(&evaluation));
    assert_return_identities(&result);
}

/// Single filer with high wages and a large interest account.
fn high_earner_with_interest() -> TaxpayerProfile {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.forms_w2 = vec![w2(dec!(300000))];
    profile.forms_1099_int = vec![Form1099Int {
        payer_name: "Treasury Direct".to_string(),
        interest_income: dec!(100000),
        ..Form1099Int::default()
    }];
    profile
}

#[test]
fn itemized_salt_runs_form_6251_with_surtaxes() {
    let mut profile = high_earner_with_interest();
    profile.uses_itemized_deductions = true;
    profile.state_local_tax_deduction = dec!(10000);

    let result = calculate_return(&profile, &config()).unwrap();

    assert_eq!(result.agi, dec!(400000));
    assert!(result.form_6251.is_some());
    // 3.8% of the 100,000 of interest, all of it above the 200,000 MAGI threshold
    assert_eq!(result.niit, dec!(3800.00));
    // 0.9% of Medicare wages over 200,000
    assert_eq!(result.additional_medicare, dec!(900.00));
    assert_return_identities(&result);
}

#[test]
fn standard_deduction_skips_form_6251() {
    let profile = high_earner_with_interest();

    let result = calculate_return(&profile, &config()).unwrap();

    assert!(result.form_6251.is_none());
    assert_eq!(result.amt, dec!(0));
    assert_eq!(result.niit, dec!(3800.00));
    assert_eq!(result.additional_medicare, dec!(900.00));
    assert_return_identities(&result);
}

// =============================================================================
// Cross-cutting properties
// =============================================================================

#[test]
fn bracket_tax_never_decreases_with_income() {
    let config = config();
    for status in FilingStatus::ALL {
        let brackets = config.brackets_for(status);
        let mut previous = Decimal::ZERO;
        let mut income = Decimal::ZERO;
        while income <= dec!(800000) {
            let tax = progressive_tax(income, brackets);
            assert!(tax >= previous, "{status}: tax fell at {income}");
            previous = tax;
            income += dec!(2500);
        }
    }
}

#[test]
fn preferential_worksheet_never_exceeds_ordinary_tax() {
    let config = config();
    for qualified in [dec!(0.01), dec!(5000), dec!(50000), dec!(400000)] {
        let mut profile = TaxpayerProfile::new(FilingStatus::Single);
        profile.forms_w2 = vec![w2(dec!(90000))];
        profile.forms_1099_div = vec![Form1099Div {
            payer_name: "Index Fund".to_string(),
            ordinary_dividends: qualified,
            qualified_dividends: qualified,
            ..Form1099Div::default()
        }];

        let result = calculate_return(&profile, &config).unwrap();

        let ordinary = progressive_tax(result.taxable_income, config.brackets_for(result.filing_status));
        assert!(result.preferential_rate.is_some());
        assert!(result.tax <= ordinary);
    }
}

#[test]
fn capital_loss_limited_by_filing_status() {
    let config = config();
    for (status, floor) in [
        (FilingStatus::MarriedFilingSeparately, dec!(-1500)),
        (FilingStatus::Single, dec!(-3000)),
        (FilingStatus::MarriedFilingJointly, dec!(-3000)),
    ] {
        let mut profile = TaxpayerProfile::new(status);
        profile.forms_w2 = vec![w2(dec!(70000))];
        profile.forms_1099_b = vec![Form1099B {
            broker_name: "Brokerage".to_string(),
            st_proceeds: dec!(10000),
            st_cost_basis: dec!(22000),
            ..Form1099B::default()
        }];

        let result = calculate_return(&profile, &config).unwrap();

        assert_eq!(result.capital_gain_loss, floor);
        let schedule_d = result.schedule_d.as_ref().unwrap();
        assert_eq!(schedule_d.loss_carryover, dec!(12000) + floor);
        assert_return_identities(&result);
    }
}

#[test]
fn self_employment_below_400_owes_no_se_tax() {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.businesses = vec![Business::from_receipts("Etsy Shop", dec!(399.99))];

    let result = calculate_return(&profile, &config()).unwrap();

    assert!(result.schedule_se.is_none());
    assert_eq!(result.se_tax, dec!(0));
    assert_return_identities(&result);
}

#[test]
fn no_dependents_leaves_credits_absent() {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.forms_w2 = vec![w2(dec!(40000))];

    let result = calculate_return(&profile, &config()).unwrap();

    assert!(result.tax_credits.is_none());
    assert!(result.qbi.is_none());
    assert!(result.schedule_se.is_none());
}

#[test]
fn zero_income_has_no_effective_rate() {
    let profile = TaxpayerProfile::new(FilingStatus::HeadOfHousehold);

    let result = calculate_return(&profile, &config()).unwrap();

    assert_eq!(result.total_income, dec!(0));
    assert_eq!(result.taxable_income, dec!(0));
    assert!(result.effective_rates().is_none());
    assert_eq!(result.amount_owed, dec!(0));
    assert_eq!(result.overpayment, dec!(0));
}

#[test]
fn withholding_produces_refund() {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.forms_w2 = vec![FormW2 {
        federal_tax_withheld: dec!(9000),
        ..w2(dec!(60000))
    }];
    profile.forms_1099_int = vec![Form1099Int {
        payer_name: "Credit Union".to_string(),
        interest_income: dec!(250),
        federal_tax_withheld: dec!(25),
        ..Form1099Int::default()
    }];

    let result = calculate_return(&profile, &config()).unwrap();

    assert_eq!(result.withholding, dec!(9025));
    assert!(result.overpayment > Decimal::ZERO);
    assert!(result.lines_for("Form 1040").any(|l| l.line == "34"));
    assert_return_identities(&result);
}

#[test]
fn profile_for_other_year_is_rejected() {
    let mut profile = TaxpayerProfile::new(FilingStatus::Single);
    profile.tax_year = 2024;

    let err = calculate_return(&profile, &config()).unwrap_err();

    assert_eq!(
        err,
        ReturnError::TaxYearMismatch {
            profile: 2024,
            config: 2025
        }
    );
}

#[test]
fn full_return_apportions_nonresident_colorado_tax() {
    let profile = mfs_expat();

    let full = calculate_full_return(&profile, &config()).unwrap();
    let colorado = full.colorado.unwrap();

    assert!(colorado.is_nonresident);
    // The only Colorado-source income is the K-1: -3,500 rental + 150 interest.
    assert_eq!(colorado.source_income, dec!(-3350));
    assert_eq!(colorado.apportionment, dec!(0));
    assert_eq!(colorado.co_tax, dec!(0));
    assert_eq!(colorado.federal_taxable_income, full.federal.taxable_income);
}

#[test]
fn result_serializes_to_json() {
    let result = calculate_return(&mfs_expat(), &config()).unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let back: Form1040Result = serde_json::from_str(&json).unwrap();

    assert_eq!(back, result);
}
