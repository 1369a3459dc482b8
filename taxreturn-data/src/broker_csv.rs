use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use taxreturn_core::Form1099B;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BrokerCsvError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),
}

impl From<csv::Error> for BrokerCsvError {
    fn from(err: csv::Error) -> Self {
        BrokerCsvError::CsvParse(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    #[serde(alias = "ST", alias = "short-term")]
    Short,
    #[serde(alias = "LT", alias = "long-term")]
    Long,
}

/// One sale from a broker's realized gain/loss export.
///
/// Columns: `broker,description,term,proceeds,cost_basis,federal_tax_withheld`.
/// The withholding column may be empty.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BrokerTransaction {
    pub broker: String,
    #[serde(default)]
    pub description: String,
    pub term: Term,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    #[serde(default, deserialize_with = "deserialize_blank_as_zero")]
    pub federal_tax_withheld: Decimal,
}

fn deserialize_blank_as_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(Decimal::ZERO),
        Some(s) => s.parse::<Decimal>().map_err(serde::de::Error::custom),
    }
}

/// Turns broker transaction exports into one Form 1099-B per broker.
pub struct BrokerCsvLoader;

impl BrokerCsvLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BrokerTransaction>, BrokerCsvError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut transactions = Vec::new();

        for result in csv_reader.deserialize() {
            let transaction: BrokerTransaction = result?;
            transactions.push(transaction);
        }

        Ok(transactions)
    }

    /// Sums transactions into 1099-B totals, one per broker in the order the
    /// brokers first appear.
    pub fn summarize(transactions: &[BrokerTransaction]) -> Vec<Form1099B> {
        let mut forms: Vec<Form1099B> = Vec::new();

        for transaction in transactions {
            let index = match forms
                .iter()
                .position(|f| f.broker_name == transaction.broker)
            {
                Some(index) => index,
                None => {
                    forms.push(Form1099B {
                        broker_name: transaction.broker.clone(),
                        ..Form1099B::default()
                    });
                    forms.len() - 1
                }
            };
            let form = &mut forms[index];
            match transaction.term {
                Term::Short => {
                    form.st_proceeds += transaction.proceeds;
                    form.st_cost_basis += transaction.cost_basis;
                }
                Term::Long => {
                    form.lt_proceeds += transaction.proceeds;
                    form.lt_cost_basis += transaction.cost_basis;
                }
            }
            form.federal_tax_withheld += transaction.federal_tax_withheld;
        }

        debug!(
            transactions = transactions.len(),
            brokers = forms.len(),
            "Broker transactions summarized"
        );
        forms
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Form1099B>, BrokerCsvError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BrokerCsvError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let transactions = Self::parse(file)?;
        Ok(Self::summarize(&transactions))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "broker,description,term,proceeds,cost_basis,federal_tax_withheld\n";

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn test_parse_accepts_term_aliases_and_blank_withholding() {
        let csv = format!("{HEADER}Fidelity,100 VTI,LT,28000,21000,\nFidelity,50 AAPL,short,9000,9800,12.50\n");

        let transactions = BrokerCsvLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].term, Term::Long);
        assert_eq!(transactions[0].federal_tax_withheld, dec!(0));
        assert_eq!(transactions[1].term, Term::Short);
        assert_eq!(transactions[1].federal_tax_withheld, dec!(12.50));
    }

    #[test]
    fn test_parse_rejects_unknown_term() {
        let csv = format!("{HEADER}Fidelity,100 VTI,medium,28000,21000,\n");

        let err = BrokerCsvLoader::parse(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, BrokerCsvError::CsvParse(_)));
    }

    // =========================================================================
    // summarize tests
    // =========================================================================

    #[test]
    fn test_summarize_groups_by_broker() {
        let csv = format!(
            "{HEADER}\
             Fidelity,100 VTI,long,28000,21000,\n\
             Schwab,10 MSFT,short,4000,4500,\n\
             Fidelity,50 AAPL,short,9000,9800,\n\
             Fidelity,20 BND,long,1500,1600,25\n"
        );
        let transactions = BrokerCsvLoader::parse(csv.as_bytes()).unwrap();

        let forms = BrokerCsvLoader::summarize(&transactions);

        assert_eq!(
            forms,
            vec![
                Form1099B {
                    broker_name: "Fidelity".to_string(),
                    st_proceeds: dec!(9000),
                    st_cost_basis: dec!(9800),
                    lt_proceeds: dec!(29500),
                    lt_cost_basis: dec!(22600),
                    federal_tax_withheld: dec!(25),
                    ..Form1099B::default()
                },
                Form1099B {
                    broker_name: "Schwab".to_string(),
                    st_proceeds: dec!(4000),
                    st_cost_basis: dec!(4500),
                    ..Form1099B::default()
                },
            ]
        );
    }
}
