use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use taxreturn_core::{FilingStatus, PerStatus, TaxBracket};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("No rate schedule for {status} in tax year {tax_year}")]
    MissingSchedule { tax_year: i32, status: FilingStatus },

    #[error("Schedule {schedule} is not contiguous at {at}")]
    NonContiguous { schedule: String, at: Decimal },

    #[error("Schedule {schedule} bracket at {min_income}: base tax {found} does not match {expected}")]
    BaseTaxMismatch {
        schedule: String,
        min_income: Decimal,
        expected: Decimal,
        found: Decimal,
    },
}

impl From<csv::Error> for BracketTableLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketTableLoaderError::CsvParse(err.to_string())
    }
}

/// Maps IRS schedule codes to filing statuses.
///
/// - Schedule X → Single
/// - Schedule Y-1 → Married Filing Jointly and Qualifying Surviving Spouse
/// - Schedule Y-2 → Married Filing Separately
/// - Schedule Z → Head of Household
fn schedule_to_filing_statuses(
    schedule: &str
) -> Result<&'static [FilingStatus], BracketTableLoaderError> {
    match schedule {
        "X" => Ok(&[FilingStatus::Single]),
        "Y-1" => Ok(&[
            FilingStatus::MarriedFilingJointly,
            FilingStatus::QualifyingSurvivingSpouse,
        ]),
        "Y-2" => Ok(&[FilingStatus::MarriedFilingSeparately]),
        "Z" => Ok(&[FilingStatus::HeadOfHousehold]),
        _ => Err(BracketTableLoaderError::InvalidSchedule(schedule.to_string())),
    }
}

/// A single record from the tax brackets CSV file.
///
/// The CSV format uses IRS schedule designations:
/// - `tax_year`: The tax year (e.g., 2025)
/// - `schedule`: The IRS schedule code (X, Y-1, Y-2, Z)
/// - `min_income`: The minimum income for this bracket
/// - `max_income`: The maximum income for this bracket (empty for unlimited)
/// - `base_tax`: The base tax amount for this bracket
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Builds bracket tables from the published IRS rate schedules.
///
/// The tables replace the built-in ones through
/// `TaxYearConfig::with_bracket_tables`.
pub struct BracketTableLoader;

impl BracketTableLoader {
    /// Parse tax bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, BracketTableLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Builds one table per filing status from the records for `tax_year`.
    ///
    /// Each schedule must start at zero with every bracket beginning where
    /// the previous one ended, and each published base tax must equal the
    /// tax on the brackets below it. Records for other years are ignored.
    pub fn build_tables(
        records: &[TaxBracketRecord],
        tax_year: i32,
    ) -> Result<PerStatus<Vec<TaxBracket>>, BracketTableLoaderError> {
        let mut groups: BTreeMap<&str, Vec<&TaxBracketRecord>> = BTreeMap::new();
        for record in records.iter().filter(|r| r.tax_year == tax_year) {
            groups
                .entry(record.schedule.as_str())
                .or_default()
                .push(record);
        }

        let mut tables: PerStatus<Option<Vec<TaxBracket>>> = PerStatus::uniform(None);
        for (schedule, mut group) in groups {
            let statuses = schedule_to_filing_statuses(schedule)?;
            group.sort_by_key(|r| r.min_income);
            let table = Self::build_schedule(schedule, &group)?;
            debug!(schedule, brackets = table.len(), "Rate schedule loaded");
            for &status in statuses {
                *tables.get_mut(status) = Some(table.clone());
            }
        }

        let missing = |status| BracketTableLoaderError::MissingSchedule { tax_year, status };
        Ok(PerStatus {
            single: tables.single.ok_or_else(|| missing(FilingStatus::Single))?,
            married_filing_jointly: tables
                .married_filing_jointly
                .ok_or_else(|| missing(FilingStatus::MarriedFilingJointly))?,
            married_filing_separately: tables
                .married_filing_separately
                .ok_or_else(|| missing(FilingStatus::MarriedFilingSeparately))?,
            head_of_household: tables
                .head_of_household
                .ok_or_else(|| missing(FilingStatus::HeadOfHousehold))?,
            qualifying_surviving_spouse: tables
                .qualifying_surviving_spouse
                .ok_or_else(|| missing(FilingStatus::QualifyingSurvivingSpouse))?,
        })
    }

    /// Parses and builds in one step.
    pub fn load<R: Read>(
        reader: R,
        tax_year: i32,
    ) -> Result<PerStatus<Vec<TaxBracket>>, BracketTableLoaderError> {
        let records = Self::parse(reader)?;
        Self::build_tables(&records, tax_year)
    }

    fn build_schedule(
        schedule: &str,
        records: &[&TaxBracketRecord],
    ) -> Result<Vec<TaxBracket>, BracketTableLoaderError> {
        let mut table = Vec::with_capacity(records.len());
        let mut expected_lower = Some(Decimal::ZERO);
        let mut expected_base = Decimal::ZERO;

        for record in records {
            if expected_lower != Some(record.min_income) {
                return Err(BracketTableLoaderError::NonContiguous {
                    schedule: schedule.to_string(),
                    at: record.min_income,
                });
            }
            if record.base_tax.round_dp(2) != expected_base.round_dp(2) {
                return Err(BracketTableLoaderError::BaseTaxMismatch {
                    schedule: schedule.to_string(),
                    min_income: record.min_income,
                    expected: expected_base.round_dp(2),
                    found: record.base_tax,
                });
            }

            table.push(TaxBracket {
                min_income: record.min_income,
                max_income: record.max_income,
                rate: record.rate,
                base_tax: record.base_tax,
            });

            expected_lower = record.max_income;
            if let Some(max) = record.max_income {
                expected_base = record.base_tax + (max - record.min_income) * record.rate;
            }
        }

        Ok(table)
    }
}
