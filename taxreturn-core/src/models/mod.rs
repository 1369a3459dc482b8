mod business;
mod documents;
mod filing_status;
mod line_item;
mod profile;
mod tax_bracket;
mod tax_year_config;

pub use business::{Business, BusinessExpenses, HomeOffice, HomeOfficeMethod};
pub use documents::{Form1099B, Form1099Div, Form1099Int, Form1099Nec, FormW2, ScheduleK1};
pub use filing_status::{FilingStatus, PerStatus};
pub use line_item::{LineItem, find_line};
pub use profile::{
    ColoradoInputs, DEFAULT_TAX_YEAR, Dependent, EstimatedPayment, ForeignResidency,
    HealthInsurance, TaxpayerProfile,
};
pub use tax_bracket::TaxBracket;
pub use tax_year_config::{
    AmtConfig, BusinessConfig, CapitalGainsConfig, ColoradoConfig, ConfigError, CreditConfig,
    EstimatedTaxConfig, FeieConfig, QbiConfig, RetirementConfig, SurtaxConfig, TaxYearConfig,
};
