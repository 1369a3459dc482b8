//! Schedule C, Profit or Loss From Business.
//!
//! | Line | Description |
//! |------|-------------|
//! | 1    | Gross receipts or sales |
//! | 2    | Returns and allowances |
//! | 4    | Cost of goods sold |
//! | 5    | Gross profit: Line 1 − Line 2 − Line 4 |
//! | 6    | Other income |
//! | 7    | Gross income: Line 5 + Line 6 |
//! | 8–27a| Expenses (meals at 50%) |
//! | 28   | Total expenses before home office |
//! | 30   | Business use of home |
//! | 31   | Net profit or (loss): Line 7 − Line 28 − Line 30 |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::models::{Business, BusinessConfig, HomeOffice, HomeOfficeMethod, LineItem};

const FORM: &str = "Schedule C";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCResult {
    pub business_name: String,
    pub gross_receipts: Decimal,
    pub returns_allowances: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub gross_profit: Decimal,
    pub other_income: Decimal,
    pub gross_income: Decimal,
    pub expenses_before_home_office: Decimal,
    pub home_office_deduction: Decimal,
    /// Line 28 plus Line 30.
    pub total_expenses: Decimal,
    pub net_profit_loss: Decimal,
    /// Line 26, used as W-2 wages for the §199A limit.
    pub wages_paid: Decimal,
    pub qbi_ubia: Decimal,
    pub lines: Vec<LineItem>,
}

/// Computes Schedule C for one business.
pub fn calculate_schedule_c(
    business: &Business,
    config: &BusinessConfig,
) -> ScheduleCResult {
    let mut lines = Vec::new();

    lines.push(LineItem::new(
        FORM,
        "1",
        "Gross receipts or sales",
        business.gross_receipts,
    ));
    lines.push(LineItem::new(
        FORM,
        "2",
        "Returns and allowances",
        business.returns_and_allowances,
    ));
    if business.cost_of_goods_sold > Decimal::ZERO {
        lines.push(LineItem::new(
            FORM,
            "4",
            "Cost of goods sold",
            business.cost_of_goods_sold,
        ));
    }

    let gross_profit = round_half_up(
        business.gross_receipts - business.returns_and_allowances - business.cost_of_goods_sold,
    );
    lines.push(
        LineItem::new(FORM, "5", "Gross profit", gross_profit)
            .with_explanation("Line 1 minus Line 2 minus Line 4"),
    );

    if business.other_income > Decimal::ZERO {
        lines.push(LineItem::new(FORM, "6", "Other income", business.other_income));
    }

    let gross_income = round_half_up(gross_profit + business.other_income);
    lines.push(
        LineItem::new(FORM, "7", "Gross income", gross_income)
            .with_explanation("Line 5 plus Line 6"),
    );

    let mut expenses_before_home_office = Decimal::ZERO;
    for (line, description, amount) in expense_lines(business, config) {
        if amount > Decimal::ZERO {
            let amount = round_half_up(amount);
            lines.push(LineItem::new(FORM, line, description, amount));
            expenses_before_home_office += amount;
        }
    }

    let home_office_deduction = match &business.home_office {
        Some(office) => {
            let (deduction, item) = home_office_line(office, config);
            lines.push(item);
            deduction
        }
        None => Decimal::ZERO,
    };

    lines.push(LineItem::new(
        FORM,
        "28",
        "Total expenses before home office",
        round_half_up(expenses_before_home_office),
    ));

    let total_expenses = round_half_up(expenses_before_home_office + home_office_deduction);
    let net_profit_loss = round_half_up(gross_income - total_expenses);
    lines.push(
        LineItem::new(FORM, "31", "Net profit or (loss)", net_profit_loss)
            .with_explanation("Line 7 minus Line 28 minus Line 30")
            .with_reference("https://www.irs.gov/instructions/i1040sc"),
    );

    debug!(
        business = %business.name,
        %gross_income,
        %total_expenses,
        %net_profit_loss,
        "Schedule C computed"
    );

    ScheduleCResult {
        business_name: business.name.clone(),
        gross_receipts: business.gross_receipts,
        returns_allowances: business.returns_and_allowances,
        cost_of_goods_sold: business.cost_of_goods_sold,
        gross_profit,
        other_income: business.other_income,
        gross_income,
        expenses_before_home_office: round_half_up(expenses_before_home_office),
        home_office_deduction,
        total_expenses,
        net_profit_loss,
        wages_paid: business.expenses.wages,
        qbi_ubia: business.qbi_ubia,
        lines,
    }
}

/// Simplified method: rate per square foot up to the area cap, prorated by
/// months of use.
pub fn simplified_home_office_deduction(
    office: &HomeOffice,
    config: &BusinessConfig,
) -> Decimal {
    let sqft = office.square_footage.min(config.home_office_max_sqft);
    round_half_up(sqft * config.home_office_rate * office.months_fraction())
}

/// Regular method (Form 8829): business percentage of the home's expenses plus
/// the business share of internet, prorated by months of use.
pub fn regular_home_office_deduction(office: &HomeOffice) -> Decimal {
    let shared = office.rent
        + office.utilities
        + office.insurance
        + office.repairs
        + office.mortgage_interest
        + office.real_estate_taxes;
    let direct = shared * office.business_percentage();
    let internet = office.internet * office.internet_fraction();
    round_half_up((direct + internet) * office.months_fraction())
}

fn home_office_line(
    office: &HomeOffice,
    config: &BusinessConfig,
) -> (Decimal, LineItem) {
    match office.method {
        HomeOfficeMethod::Simplified => {
            let deduction = simplified_home_office_deduction(office, config);
            let sqft = office.square_footage.min(config.home_office_max_sqft);
            let item = LineItem::new(
                FORM,
                "30",
                "Business use of home (simplified method)",
                deduction,
            )
            .with_explanation(format!(
                "{} sqft × ${}/sqft × {}/12 months",
                sqft.normalize(),
                config.home_office_rate.normalize(),
                office.months_used
            ));
            (deduction, item)
        }
        HomeOfficeMethod::Regular => {
            let deduction = regular_home_office_deduction(office);
            let pct = round_half_up(office.business_percentage() * Decimal::ONE_HUNDRED);
            let item = LineItem::new(
                FORM,
                "30",
                "Business use of home (regular method, Form 8829)",
                deduction,
            )
            .with_explanation(format!("{pct}% business use"));
            (deduction, item)
        }
    }
}

fn expense_lines(
    business: &Business,
    config: &BusinessConfig,
) -> [(&'static str, &'static str, Decimal); 22] {
    let e = &business.expenses;
    [
        ("8", "Advertising", e.advertising),
        ("9", "Car and truck expenses", e.car_and_truck),
        ("10", "Commissions and fees", e.commissions_and_fees),
        ("11", "Contract labor", e.contract_labor),
        ("13", "Depreciation", e.depreciation),
        ("14", "Employee benefit programs", e.employee_benefit_programs),
        ("15", "Insurance (other than health)", e.insurance),
        ("16a", "Interest: mortgage", e.interest_mortgage),
        ("16b", "Interest: other", e.interest_other),
        ("17", "Legal and professional services", e.legal_and_professional),
        ("18", "Office expense", e.office_expense),
        ("19", "Pension and profit-sharing plans", e.pension_profit_sharing),
        ("20a", "Rent: vehicles/equipment", e.rent_vehicles_equipment),
        ("20b", "Rent: other", e.rent_other),
        ("21", "Repairs and maintenance", e.repairs_maintenance),
        ("22", "Supplies", e.supplies),
        ("23", "Taxes and licenses", e.taxes_licenses),
        ("24a", "Travel", e.travel),
        (
            "24b",
            "Meals (50%)",
            round_half_up(e.meals * config.meals_deduction_rate),
        ),
        ("25", "Utilities", e.utilities),
        ("26", "Wages", e.wages),
        ("27a", "Other expenses", e.other_expenses),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{BusinessExpenses, find_line};

    fn config() -> BusinessConfig {
        BusinessConfig {
            meals_deduction_rate: dec!(0.50),
            home_office_rate: dec!(5.00),
            home_office_max_sqft: dec!(300),
        }
    }

    fn regular_office() -> HomeOffice {
        HomeOffice {
            method: HomeOfficeMethod::Regular,
            total_home_sqft: dec!(1000),
            office_sqft: dec!(200),
            ..HomeOffice::default()
        }
    }

    // =========================================================================
    // calculate_schedule_c tests
    // =========================================================================

    #[test]
    fn calculate_schedule_c_with_receipts_only() {
        let business = Business::from_receipts("Design Studio", dec!(50000));

        let result = calculate_schedule_c(&business, &config());

        assert_eq!(result.gross_income, dec!(50000));
        assert_eq!(result.total_expenses, dec!(0));
        assert_eq!(result.net_profit_loss, dec!(50000));
    }

    #[test]
    fn calculate_schedule_c_subtracts_returns_and_cogs() {
        let business = Business {
            name: "Retail".to_string(),
            gross_receipts: dec!(100000),
            returns_and_allowances: dec!(5000),
            cost_of_goods_sold: dec!(30000),
            other_income: dec!(1000),
            ..Business::default()
        };

        let result = calculate_schedule_c(&business, &config());

        assert_eq!(result.gross_profit, dec!(65000));
        assert_eq!(result.gross_income, dec!(66000));
        assert_eq!(result.net_profit_loss, dec!(66000));
        assert!(find_line(&result.lines, FORM, "4").is_some());
        assert!(find_line(&result.lines, FORM, "6").is_some());
    }

    #[test]
    fn calculate_schedule_c_deducts_half_of_meals() {
        let business = Business {
            name: "Consulting".to_string(),
            gross_receipts: dec!(120000),
            expenses: BusinessExpenses {
                office_expense: dec!(1200),
                supplies: dec!(500),
                travel: dec!(3000),
                meals: dec!(2000),
                legal_and_professional: dec!(800),
                ..BusinessExpenses::default()
            },
            ..Business::default()
        };

        let result = calculate_schedule_c(&business, &config());

        let meals = find_line(&result.lines, FORM, "24b").unwrap();
        assert_eq!(meals.amount, dec!(1000.00));
        assert_eq!(result.total_expenses, dec!(6500.00));
        assert_eq!(result.net_profit_loss, dec!(113500.00));
    }

    #[test]
    fn calculate_schedule_c_omits_zero_expense_lines() {
        let business = Business {
            name: "Lean".to_string(),
            gross_receipts: dec!(10000),
            expenses: BusinessExpenses {
                supplies: dec!(100),
                ..BusinessExpenses::default()
            },
            ..Business::default()
        };

        let result = calculate_schedule_c(&business, &config());

        assert!(find_line(&result.lines, FORM, "22").is_some());
        assert!(find_line(&result.lines, FORM, "8").is_none());
        assert!(find_line(&result.lines, FORM, "24b").is_none());
    }

    #[test]
    fn calculate_schedule_c_reports_loss() {
        let business = Business {
            name: "Startup".to_string(),
            gross_receipts: dec!(500),
            expenses: BusinessExpenses {
                advertising: dec!(2500),
                ..BusinessExpenses::default()
            },
            ..Business::default()
        };

        let result = calculate_schedule_c(&business, &config());

        assert_eq!(result.net_profit_loss, dec!(-2000.00));
    }

    #[test]
    fn calculate_schedule_c_adds_simplified_home_office() {
        let business = Business {
            name: "Home Studio".to_string(),
            gross_receipts: dec!(80000),
            expenses: BusinessExpenses {
                supplies: dec!(1000),
                ..BusinessExpenses::default()
            },
            home_office: Some(HomeOffice {
                square_footage: dec!(200),
                ..HomeOffice::default()
            }),
            ..Business::default()
        };

        let result = calculate_schedule_c(&business, &config());

        assert_eq!(result.home_office_deduction, dec!(1000.00));
        assert_eq!(result.expenses_before_home_office, dec!(1000.00));
        assert_eq!(result.total_expenses, dec!(2000.00));
        assert_eq!(result.net_profit_loss, dec!(78000.00));
        let line_28 = find_line(&result.lines, FORM, "28").unwrap();
        assert_eq!(line_28.amount, dec!(1000.00));
    }

    #[test]
    fn calculate_schedule_c_carries_wages_for_qbi() {
        let business = Business {
            name: "Agency".to_string(),
            gross_receipts: dec!(300000),
            expenses: BusinessExpenses {
                wages: dec!(90000),
                ..BusinessExpenses::default()
            },
            qbi_ubia: dec!(40000),
            ..Business::default()
        };

        let result = calculate_schedule_c(&business, &config());

        assert_eq!(result.wages_paid, dec!(90000));
        assert_eq!(result.qbi_ubia, dec!(40000));
        assert_eq!(result.net_profit_loss, dec!(210000));
    }

    // =========================================================================
    // simplified_home_office_deduction tests
    // =========================================================================

    #[test]
    fn simplified_home_office_caps_square_footage() {
        let office = HomeOffice {
            square_footage: dec!(450),
            ..HomeOffice::default()
        };

        assert_eq!(simplified_home_office_deduction(&office, &config()), dec!(1500.00));
    }

    #[test]
    fn simplified_home_office_prorates_partial_year() {
        let office = HomeOffice {
            square_footage: dec!(300),
            months_used: 6,
            ..HomeOffice::default()
        };

        assert_eq!(simplified_home_office_deduction(&office, &config()), dec!(750.00));
    }

    // =========================================================================
    // regular_home_office_deduction tests
    // =========================================================================

    #[test]
    fn regular_home_office_shares_expenses_and_internet() {
        let office = HomeOffice {
            rent: dec!(12000),
            utilities: dec!(2400),
            insurance: dec!(1200),
            repairs: dec!(600),
            internet: dec!(1200),
            internet_business_pct: dec!(0.60),
            ..regular_office()
        };

        // (12,000 + 2,400 + 1,200 + 600) × 20% + 1,200 × 60%
        assert_eq!(regular_home_office_deduction(&office), dec!(3960.00));
    }

    #[test]
    fn regular_home_office_includes_mortgage_interest() {
        let office = HomeOffice {
            total_home_sqft: dec!(2000),
            office_sqft: dec!(400),
            mortgage_interest: dec!(12000),
            ..regular_office()
        };

        assert_eq!(regular_home_office_deduction(&office), dec!(2400.00));
    }

    #[test]
    fn regular_home_office_includes_real_estate_taxes() {
        let office = HomeOffice {
            total_home_sqft: dec!(2000),
            office_sqft: dec!(400),
            real_estate_taxes: dec!(6000),
            ..regular_office()
        };

        assert_eq!(regular_home_office_deduction(&office), dec!(1200.00));
    }

    #[test]
    fn regular_home_office_with_every_expense() {
        let office = HomeOffice {
            rent: dec!(12000),
            utilities: dec!(2400),
            insurance: dec!(1200),
            repairs: dec!(600),
            internet: dec!(1200),
            internet_business_pct: dec!(0.60),
            mortgage_interest: dec!(18000),
            real_estate_taxes: dec!(6000),
            ..regular_office()
        };

        assert_eq!(regular_home_office_deduction(&office), dec!(8760.00));
    }

    #[test]
    fn regular_home_office_accepts_whole_percentage_for_internet() {
        let office = HomeOffice {
            internet: dec!(1200),
            internet_business_pct: dec!(50),
            ..regular_office()
        };

        assert_eq!(regular_home_office_deduction(&office), dec!(600.00));
    }

    #[test]
    fn regular_home_office_is_zero_without_home_area() {
        let office = HomeOffice {
            method: HomeOfficeMethod::Regular,
            rent: dec!(12000),
            office_sqft: dec!(200),
            ..HomeOffice::default()
        };

        assert_eq!(regular_home_office_deduction(&office), dec!(0));
    }
}
