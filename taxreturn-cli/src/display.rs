use std::fmt;

use rust_decimal::Decimal;
use taxreturn_core::LineItem;

use crate::report::Report;

/// Format decimal as currency string.
fn fmt_currency(val: Decimal) -> String {
    format!("${:.2}", val)
}

fn fmt_percent(fraction: Decimal) -> String {
    format!("{:.2}%", fraction * Decimal::ONE_HUNDRED)
}

/// Plain-text rendering of a [`Report`].
pub struct TextReport<'a> {
    report: &'a Report,
    detail: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(
        report: &'a Report,
        detail: bool,
    ) -> Self {
        Self { report, detail }
    }

    fn federal_summary(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let r = &self.report.federal;
        writeln!(f, "FEDERAL RETURN ({} {})", r.tax_year, r.filing_status)?;
        writeln!(f, "{}", "=".repeat(50))?;
        if !self.report.taxpayer.is_empty() {
            writeln!(f, "Taxpayer:            {}", self.report.taxpayer)?;
        }
        writeln!(f, "Total income:        {:>14}", fmt_currency(r.total_income))?;
        writeln!(f, "Adjustments:         {:>14}", fmt_currency(r.adjustments))?;
        writeln!(f, "AGI:                 {:>14}", fmt_currency(r.agi))?;
        writeln!(f, "Standard deduction:  {:>14}", fmt_currency(r.deduction))?;
        writeln!(f, "QBI deduction:       {:>14}", fmt_currency(r.qbi_deduction))?;
        writeln!(f, "Taxable income:      {:>14}", fmt_currency(r.taxable_income))?;
        writeln!(f)?;
        writeln!(f, "Income tax:          {:>14}", fmt_currency(r.tax))?;
        writeln!(f, "SE tax:              {:>14}", fmt_currency(r.se_tax))?;
        if r.additional_medicare > Decimal::ZERO {
            writeln!(f, "Additional Medicare: {:>14}", fmt_currency(r.additional_medicare))?;
        }
        if r.niit > Decimal::ZERO {
            writeln!(f, "NIIT:                {:>14}", fmt_currency(r.niit))?;
        }
        if r.amt > Decimal::ZERO {
            writeln!(f, "AMT:                 {:>14}", fmt_currency(r.amt))?;
        }
        if r.nonrefundable_credits > Decimal::ZERO {
            writeln!(f, "Credits:             {:>14}", fmt_currency(-r.nonrefundable_credits))?;
        }
        writeln!(f, "Total tax:           {:>14}", fmt_currency(r.total_tax))?;
        writeln!(f)?;
        writeln!(f, "Withholding:         {:>14}", fmt_currency(r.withholding))?;
        writeln!(f, "Estimated payments:  {:>14}", fmt_currency(r.estimated_payments))?;
        if r.refundable_credits > Decimal::ZERO {
            writeln!(f, "Refundable credits:  {:>14}", fmt_currency(r.refundable_credits))?;
        }
        writeln!(f, "Total payments:      {:>14}", fmt_currency(r.total_payments))?;
        if r.overpayment > Decimal::ZERO {
            writeln!(f, "REFUND:              {:>14}", fmt_currency(r.overpayment))?;
        } else {
            writeln!(f, "AMOUNT OWED:         {:>14}", fmt_currency(r.amount_owed))?;
        }

        match &self.report.effective_rates {
            Some(rates) => {
                writeln!(f, "Effective rate:      {:>14}", fmt_percent(rates.total_tax_rate))?;
            }
            None => writeln!(f, "Effective rate:      {:>14}", "n/a")?,
        }

        if let Some(feie) = &r.feie {
            writeln!(f)?;
            if feie.is_beneficial {
                writeln!(
                    f,
                    "FEIE: would exclude {} and save {} in income tax",
                    fmt_currency(feie.exclusion_amount),
                    fmt_currency(feie.savings)
                )?;
            } else {
                writeln!(
                    f,
                    "FEIE: not beneficial ({} days abroad)",
                    feie.days_in_foreign_country
                )?;
            }
        }
        Ok(())
    }

    fn colorado_summary(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let Some(co) = &self.report.colorado else {
            return Ok(());
        };
        writeln!(f)?;
        writeln!(f, "COLORADO FORM 104")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "Colorado taxable:    {:>14}", fmt_currency(co.co_taxable_income))?;
        writeln!(f, "Tax before PN:       {:>14}", fmt_currency(co.tax_before_apportionment))?;
        if co.is_nonresident {
            writeln!(f, "CO-source income:    {:>14}", fmt_currency(co.source_income))?;
            writeln!(f, "Apportionment:       {:>14}", fmt_percent(co.apportionment))?;
        }
        writeln!(f, "Colorado tax:        {:>14}", fmt_currency(co.co_tax))
    }

    fn estimated_plan(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let plan = &self.report.estimated_plan;
        writeln!(f)?;
        writeln!(f, "ESTIMATED TAX PLAN ({})", self.report.federal.tax_year + 1)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Current year safe harbor: {:>12}",
            fmt_currency(plan.safe_harbor_current_year)
        )?;
        if let Some(prior) = plan.safe_harbor_prior_year {
            writeln!(f, "Prior year safe harbor:   {:>12}", fmt_currency(prior))?;
        }
        writeln!(f, "Method used:              {}", plan.method)?;
        writeln!(
            f,
            "Required annual payment:  {:>12}",
            fmt_currency(plan.required_annual_payment)
        )?;
        if !plan.estimated_payments_required {
            return writeln!(f, "No estimated payments required.");
        }
        for payment in &plan.payments {
            writeln!(
                f,
                "  Q{} due {}      {:>12}",
                payment.quarter,
                payment.due_date.format("%b %d, %Y"),
                fmt_currency(payment.amount)
            )?;
        }
        Ok(())
    }

    fn recommendations(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.report.recommendations.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "RECOMMENDATIONS")?;
        writeln!(f, "{}", "=".repeat(50))?;
        for (index, rec) in self.report.recommendations.iter().enumerate() {
            writeln!(
                f,
                "{}. {} (saves ~{})",
                index + 1,
                rec.title,
                fmt_currency(rec.estimated_savings)
            )?;
            writeln!(f, "   {}", rec.description)?;
        }
        Ok(())
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.federal_summary(f)?;
        self.colorado_summary(f)?;
        self.estimated_plan(f)?;
        self.recommendations(f)?;

        if self.detail {
            writeln!(f)?;
            writeln!(f, "LINE DETAIL")?;
            writeln!(f, "{}", "=".repeat(50))?;
            write!(f, "{}", LineDetail(&self.report.federal.lines))?;
            if let Some(co) = &self.report.colorado {
                write!(f, "{}", LineDetail(&co.lines))?;
            }
        }
        Ok(())
    }
}

/// Every line item, grouped under a heading per form.
pub struct LineDetail<'a>(pub &'a [LineItem]);

impl fmt::Display for LineDetail<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut current_form: Option<&str> = None;
        for item in self.0 {
            if current_form != Some(item.form.as_str()) {
                writeln!(f, "{}", item.form)?;
                current_form = Some(item.form.as_str());
            }
            writeln!(
                f,
                "  {:<6} {:<48} {:>14}",
                item.line,
                item.description,
                fmt_currency(item.amount)
            )?;
            if !item.explanation.is_empty() {
                writeln!(f, "         {}", item.explanation)?;
            }
        }
        Ok(())
    }
}
