use serde::{Deserialize, Serialize};

/// Federal filing status for the return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    #[serde(alias = "S")]
    Single,
    #[serde(alias = "MFJ")]
    MarriedFilingJointly,
    #[serde(alias = "MFS")]
    MarriedFilingSeparately,
    #[serde(alias = "HOH")]
    HeadOfHousehold,
    #[serde(alias = "QSS")]
    QualifyingSurvivingSpouse,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 5] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingSurvivingSpouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::MarriedFilingSeparately => "MFS",
            Self::HeadOfHousehold => "HOH",
            Self::QualifyingSurvivingSpouse => "QSS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::Single),
            "MFJ" => Some(Self::MarriedFilingJointly),
            "MFS" => Some(Self::MarriedFilingSeparately),
            "HOH" => Some(Self::HeadOfHousehold),
            "QSS" => Some(Self::QualifyingSurvivingSpouse),
            _ => None,
        }
    }

    /// Statuses that use the joint-return thresholds (MFJ and QSS).
    pub fn is_joint(&self) -> bool {
        matches!(
            self,
            Self::MarriedFilingJointly | Self::QualifyingSurvivingSpouse
        )
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per filing status.
///
/// Every table keyed by filing status is stored this way so a lookup can never
/// miss a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerStatus<T> {
    pub single: T,
    pub married_filing_jointly: T,
    pub married_filing_separately: T,
    pub head_of_household: T,
    pub qualifying_surviving_spouse: T,
}

impl<T> PerStatus<T> {
    pub fn get(
        &self,
        status: FilingStatus,
    ) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => &self.married_filing_separately,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
            FilingStatus::QualifyingSurvivingSpouse => &self.qualifying_surviving_spouse,
        }
    }

    pub fn get_mut(
        &mut self,
        status: FilingStatus,
    ) -> &mut T {
        match status {
            FilingStatus::Single => &mut self.single,
            FilingStatus::MarriedFilingJointly => &mut self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => &mut self.married_filing_separately,
            FilingStatus::HeadOfHousehold => &mut self.head_of_household,
            FilingStatus::QualifyingSurvivingSpouse => &mut self.qualifying_surviving_spouse,
        }
    }

    /// Iterates `(status, value)` pairs in [`FilingStatus::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (FilingStatus, &T)> {
        FilingStatus::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl<T: Clone> PerStatus<T> {
    /// Table where joint filers (MFJ, QSS) share one value, MFS has its own,
    /// and Single/HOH share the rest.
    pub fn joint_separate_other(
        joint: T,
        separate: T,
        other: T,
    ) -> Self {
        Self {
            single: other.clone(),
            married_filing_jointly: joint.clone(),
            married_filing_separately: separate,
            head_of_household: other,
            qualifying_surviving_spouse: joint,
        }
    }

    pub fn uniform(value: T) -> Self {
        Self {
            single: value.clone(),
            married_filing_jointly: value.clone(),
            married_filing_separately: value.clone(),
            head_of_household: value.clone(),
            qualifying_surviving_spouse: value,
        }
    }
}
