use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One computed line on a tax form, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub form: String,
    pub line: String,
    pub description: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub irs_reference: String,
}

impl LineItem {
    pub fn new(
        form: impl Into<String>,
        line: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            form: form.into(),
            line: line.into(),
            description: description.into(),
            amount,
            explanation: String::new(),
            irs_reference: String::new(),
        }
    }

    pub fn with_explanation(
        mut self,
        explanation: impl Into<String>,
    ) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_reference(
        mut self,
        irs_reference: impl Into<String>,
    ) -> Self {
        self.irs_reference = irs_reference.into();
        self
    }
}

/// Finds the first line with the given form and line number.
pub fn find_line<'a>(
    lines: &'a [LineItem],
    form: &str,
    line: &str,
) -> Option<&'a LineItem> {
    lines.iter().find(|item| item.form == form && item.line == line)
}
