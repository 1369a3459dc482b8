use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A sole proprietorship reported on its own Schedule C.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Business {
    pub name: String,
    pub gross_receipts: Decimal,
    pub returns_and_allowances: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub other_income: Decimal,
    pub expenses: BusinessExpenses,
    pub home_office: Option<HomeOffice>,
    /// Unadjusted basis of qualified property, for the §199A wage/capital limit.
    pub qbi_ubia: Decimal,
}

impl Business {
    /// A business consisting only of gross receipts.
    pub fn from_receipts(
        name: impl Into<String>,
        gross_receipts: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            gross_receipts,
            ..Self::default()
        }
    }
}

/// Schedule C Part II expenses, amounts as paid.
///
/// `meals` is the full amount spent; the deductible share is applied when the
/// schedule is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessExpenses {
    pub advertising: Decimal,
    pub car_and_truck: Decimal,
    pub commissions_and_fees: Decimal,
    pub contract_labor: Decimal,
    pub depreciation: Decimal,
    pub employee_benefit_programs: Decimal,
    pub insurance: Decimal,
    pub interest_mortgage: Decimal,
    pub interest_other: Decimal,
    pub legal_and_professional: Decimal,
    pub office_expense: Decimal,
    pub pension_profit_sharing: Decimal,
    pub rent_vehicles_equipment: Decimal,
    pub rent_other: Decimal,
    pub repairs_maintenance: Decimal,
    pub supplies: Decimal,
    pub taxes_licenses: Decimal,
    pub travel: Decimal,
    pub meals: Decimal,
    pub utilities: Decimal,
    pub wages: Decimal,
    pub other_expenses: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeOfficeMethod {
    #[default]
    Simplified,
    /// Actual expenses, Form 8829.
    Regular,
}

/// Business use of home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeOffice {
    pub method: HomeOfficeMethod,
    /// Office area claimed under the simplified method.
    pub square_footage: Decimal,
    pub months_used: u32,
    pub total_home_sqft: Decimal,
    pub office_sqft: Decimal,
    pub rent: Decimal,
    pub utilities: Decimal,
    pub insurance: Decimal,
    pub repairs: Decimal,
    pub mortgage_interest: Decimal,
    pub real_estate_taxes: Decimal,
    pub internet: Decimal,
    /// Either a fraction (0.6) or a whole percentage (60).
    pub internet_business_pct: Decimal,
}

impl Default for HomeOffice {
    fn default() -> Self {
        Self {
            method: HomeOfficeMethod::Simplified,
            square_footage: Decimal::ZERO,
            months_used: 12,
            total_home_sqft: Decimal::ZERO,
            office_sqft: Decimal::ZERO,
            rent: Decimal::ZERO,
            utilities: Decimal::ZERO,
            insurance: Decimal::ZERO,
            repairs: Decimal::ZERO,
            mortgage_interest: Decimal::ZERO,
            real_estate_taxes: Decimal::ZERO,
            internet: Decimal::ZERO,
            internet_business_pct: Decimal::ZERO,
        }
    }
}

impl HomeOffice {
    /// Office area over total home area, zero when the home area is unknown.
    pub fn business_percentage(&self) -> Decimal {
        if self.total_home_sqft.is_zero() {
            return Decimal::ZERO;
        }
        self.office_sqft / self.total_home_sqft
    }

    pub fn months_fraction(&self) -> Decimal {
        Decimal::from(self.months_used) / Decimal::from(12)
    }

    /// Internet business share as a fraction.
    pub fn internet_fraction(&self) -> Decimal {
        if self.internet_business_pct > Decimal::ONE {
            self.internet_business_pct / Decimal::ONE_HUNDRED
        } else {
            self.internet_business_pct
        }
    }
}
