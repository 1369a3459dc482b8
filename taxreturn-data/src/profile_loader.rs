use std::fs;
use std::path::{Path, PathBuf};

use taxreturn_core::TaxpayerProfile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reads taxpayer profiles written in TOML.
///
/// Every table and amount is optional; anything left out takes the profile
/// default (zero amounts, no documents, tax year 2025).
pub struct ProfileLoader;

impl ProfileLoader {
    pub fn parse(source: &str) -> Result<TaxpayerProfile, ProfileLoadError> {
        let profile: TaxpayerProfile = toml::from_str(source)?;
        debug!(
            filing_status = %profile.filing_status,
            tax_year = profile.tax_year,
            businesses = profile.businesses.len(),
            k1s = profile.schedule_k1s.len(),
            "Profile parsed"
        );
        Ok(profile)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<TaxpayerProfile, ProfileLoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ProfileLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use taxreturn_core::{FilingStatus, HomeOfficeMethod};

    use super::*;

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn test_parse_minimal_profile_uses_defaults() {
        let profile = ProfileLoader::parse(r#"filing_status = "single""#).unwrap();

        assert_eq!(profile.filing_status, FilingStatus::Single);
        assert_eq!(profile.tax_year, 2025);
        assert!(profile.forms_w2.is_empty());
        assert_eq!(profile.prior_year_tax, dec!(0));
    }

    #[test]
    fn test_parse_documents_and_business() {
        let toml = r#"
            filing_status = "married_filing_separately"
            taxpayer_age = 41
            state = "CO"

            [[forms_w2]]
            employer_name = "Acme"
            wages = "52000"
            federal_tax_withheld = "6100"

            [[businesses]]
            name = "Law Consulting"
            gross_receipts = "98000"

            [businesses.expenses]
            supplies = "2000"
            meals = "800"

            [businesses.home_office]
            method = "simplified"
            square_footage = "150"
            months_used = 12

            [[schedule_k1s]]
            partnership_name = "Front Range Rentals LLC"
            net_rental_income = "-3500"
            interest_income = "150"

            [colorado]
            has_filing_obligation = true
        "#;

        let profile = ProfileLoader::parse(toml).unwrap();

        assert_eq!(profile.filing_status, FilingStatus::MarriedFilingSeparately);
        assert_eq!(profile.forms_w2[0].wages, dec!(52000));
        let business = &profile.businesses[0];
        assert_eq!(business.expenses.meals, dec!(800));
        let office = business.home_office.as_ref().unwrap();
        assert_eq!(office.method, HomeOfficeMethod::Simplified);
        assert_eq!(office.square_footage, dec!(150));
        assert_eq!(profile.schedule_k1s[0].net_rental_income, dec!(-3500));
        assert!(profile.colorado.has_filing_obligation);
    }

    #[test]
    fn test_parse_rejects_unknown_filing_status() {
        let err = ProfileLoader::parse(r#"filing_status = "widowed""#).unwrap_err();

        assert!(matches!(err, ProfileLoadError::Parse(_)));
    }

    // =========================================================================
    // load tests
    // =========================================================================

    #[test]
    fn test_load_missing_file() {
        let err = ProfileLoader::load("does/not/exist.toml").unwrap_err();

        let ProfileLoadError::Io { path, .. } = err else {
            panic!("Expected Io error, got: {err:?}");
        };
        assert_eq!(path, PathBuf::from("does/not/exist.toml"));
    }
}
