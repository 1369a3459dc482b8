//! File formats feeding the return engine: IRS rate-schedule CSVs, taxpayer
//! profiles in TOML and broker transaction exports.

mod bracket_loader;
mod broker_csv;
mod profile_loader;

pub use bracket_loader::{BracketTableLoader, BracketTableLoaderError, TaxBracketRecord};
pub use broker_csv::{BrokerCsvError, BrokerCsvLoader, BrokerTransaction, Term};
pub use profile_loader::{ProfileLoadError, ProfileLoader};
