//! Financial statement assembly: balance sheet and income statement.
//!
//! Sections are built from trial-balance rows grouped by the accounts'
//! statement group. Balances are presented on each section's presentation
//! side, so contra accounts (whose actual balance sits on the opposite side)
//! come out negative and are netted by plain summation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partida_core::{AccountId, is_within_tolerance};

use crate::chart::{Chart, NormalSide, StatementGroup};
use crate::trial_balance::{TrialBalance, TrialBalanceRow};

/// One account within a section, with its presented balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    /// Positive on the section's presentation side; negative for contra
    /// accounts (e.g. accumulated depreciation inside an asset section).
    pub balance: Decimal,
    pub is_contra: bool,
}

/// A labelled group of accounts with subtotal and contra-netted total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSection {
    pub group: StatementGroup,
    pub label: String,
    pub lines: Vec<StatementLine>,
    /// Sum of non-contra balances.
    pub subtotal: Decimal,
    /// Subtotal minus contra balances (= sum of all presented balances).
    pub net_total: Decimal,
}

/// Balance sheet. `total_equity` includes the current-period net income
/// carried over from the income statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub asset_sections: Vec<StatementSection>,
    pub liability_sections: Vec<StatementSection>,
    pub equity_section: StatementSection,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    pub net_income: Decimal,
    pub is_balanced: bool,
}

/// Income statement. Expense sections carry negative `net_total` so every
/// step of the cascade is pure addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub sales: StatementSection,
    pub cost_of_goods_sold: StatementSection,
    pub gross_profit: Decimal,
    pub admin_expenses: StatementSection,
    pub selling_expenses: StatementSection,
    pub operating_income: Decimal,
    pub financial_results: StatementSection,
    pub other_results: StatementSection,
    pub net_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statements {
    pub balance_sheet: BalanceSheet,
    pub income_statement: IncomeStatement,
}

/// Balance as presented within a section: the row's net debit balance for
/// debit-presented sections, mirrored for credit-presented ones.
fn presented_balance(row: &TrialBalanceRow, side: NormalSide) -> Decimal {
    let net_debit = row.balance_debit - row.balance_credit;
    match side {
        NormalSide::Debit => net_debit,
        NormalSide::Credit => -net_debit,
    }
}

fn build_section(group: StatementGroup, trial_balance: &TrialBalance, chart: &Chart) -> StatementSection {
    let side = group.presentation_side();
    let mut lines = Vec::new();
    let mut subtotal = Decimal::ZERO;
    let mut net_total = Decimal::ZERO;

    for row in &trial_balance.rows {
        let Some(account) = chart.get(row.account_id) else {
            continue;
        };
        if account.statement_group != Some(group) {
            continue;
        }
        let balance = presented_balance(row, side);
        if balance == Decimal::ZERO {
            continue;
        }

        if !account.is_contra {
            subtotal += balance;
        }
        net_total += balance;

        lines.push(StatementLine {
            account_id: row.account_id,
            code: row.code.clone(),
            name: row.name.clone(),
            balance,
            is_contra: account.is_contra,
        });
    }

    StatementSection {
        group,
        label: group.label().to_string(),
        lines,
        subtotal,
        net_total,
    }
}

/// Group trial-balance rows into the balance sheet and income statement.
pub fn compute_statements(trial_balance: &TrialBalance, chart: &Chart) -> Statements {
    let section = |group| build_section(group, trial_balance, chart);

    let sales = section(StatementGroup::Sales);
    let cost_of_goods_sold = section(StatementGroup::CostOfGoodsSold);
    let admin_expenses = section(StatementGroup::AdminExpenses);
    let selling_expenses = section(StatementGroup::SellingExpenses);
    let financial_results = section(StatementGroup::FinancialResults);
    let other_results = section(StatementGroup::OtherResults);

    let gross_profit = sales.net_total + cost_of_goods_sold.net_total;
    let operating_income =
        gross_profit + admin_expenses.net_total + selling_expenses.net_total;
    let net_income = operating_income + financial_results.net_total + other_results.net_total;

    let income_statement = IncomeStatement {
        sales,
        cost_of_goods_sold,
        gross_profit,
        admin_expenses,
        selling_expenses,
        operating_income,
        financial_results,
        other_results,
        net_income,
    };

    let asset_sections = vec![
        section(StatementGroup::CurrentAssets),
        section(StatementGroup::NonCurrentAssets),
    ];
    let liability_sections = vec![
        section(StatementGroup::CurrentLiabilities),
        section(StatementGroup::NonCurrentLiabilities),
    ];
    let equity_section = section(StatementGroup::Equity);

    let total_assets: Decimal = asset_sections.iter().map(|s| s.net_total).sum();
    let total_liabilities: Decimal = liability_sections.iter().map(|s| s.net_total).sum();
    let total_equity = equity_section.net_total + net_income;
    let is_balanced = is_within_tolerance(total_assets - (total_liabilities + total_equity));

    let balance_sheet = BalanceSheet {
        asset_sections,
        liability_sections,
        equity_section,
        total_assets,
        total_liabilities,
        total_equity,
        net_income,
        is_balanced,
    };

    Statements {
        balance_sheet,
        income_statement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Account, AccountKind};
    use crate::journal::{EntryLine, JournalEntry, validate};
    use crate::ledger::compute_ledger;
    use crate::trial_balance::compute_trial_balance;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 30).unwrap()
    }

    fn statements_for(accounts: Vec<Account>, entries: Vec<JournalEntry>) -> Statements {
        let chart = Chart::new(accounts);
        for entry in &entries {
            assert!(validate(entry, &chart).ok, "fixture entry must validate");
        }
        let ledger = compute_ledger(&entries, &chart).unwrap();
        let tb = compute_trial_balance(&ledger, &chart);
        assert!(tb.is_balanced);
        compute_statements(&tb, &chart)
    }

    #[test]
    fn contra_account_nets_against_its_section() {
        let muebles = Account::new("1.2.01", "Muebles y útiles", AccountKind::Asset)
            .with_group(StatementGroup::NonCurrentAssets);
        let amort = Account::new("1.2.02", "Amortización acumulada", AccountKind::Asset)
            .contra()
            .with_group(StatementGroup::NonCurrentAssets);
        let capital = Account::new("3.1.01", "Capital social", AccountKind::Equity)
            .with_group(StatementGroup::Equity);
        let gastos = Account::new("5.1.01", "Amortizaciones", AccountKind::Expense)
            .with_group(StatementGroup::AdminExpenses);
        let (muebles_id, amort_id, capital_id, gastos_id) =
            (muebles.id, amort.id, capital.id, gastos.id);

        let statements = statements_for(
            vec![muebles, amort, capital, gastos],
            vec![
                JournalEntry::new(
                    date(),
                    "Compra de muebles",
                    vec![
                        EntryLine::debit(muebles_id, dec!(5000)),
                        EntryLine::credit(capital_id, dec!(5000)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Amortización del ejercicio",
                    vec![
                        EntryLine::debit(gastos_id, dec!(500)),
                        EntryLine::credit(amort_id, dec!(500)),
                    ],
                ),
            ],
        );

        let non_current = &statements.balance_sheet.asset_sections[1];
        assert_eq!(non_current.subtotal, dec!(5000));
        assert_eq!(non_current.net_total, dec!(4500));

        let amort_line = non_current
            .lines
            .iter()
            .find(|l| l.is_contra)
            .expect("contra line present");
        assert_eq!(amort_line.balance, dec!(-500));
    }

    #[test]
    fn income_cascade_with_cogs() {
        let caja = Account::new("1.1.01", "Caja", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let mercaderias = Account::new("1.1.05", "Mercaderías", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let ventas = Account::new("4.1.01", "Ventas", AccountKind::Income)
            .with_group(StatementGroup::Sales);
        let cmv = Account::new("5.1.01", "Costo de mercaderías vendidas", AccountKind::Expense)
            .with_group(StatementGroup::CostOfGoodsSold);
        let (caja_id, merc_id, ventas_id, cmv_id) = (caja.id, mercaderias.id, ventas.id, cmv.id);

        let statements = statements_for(
            vec![caja, mercaderias, ventas, cmv],
            vec![
                JournalEntry::new(
                    date(),
                    "Venta",
                    vec![
                        EntryLine::debit(caja_id, dec!(5000)),
                        EntryLine::credit(ventas_id, dec!(5000)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Costo de la venta",
                    vec![
                        EntryLine::debit(cmv_id, dec!(2000)),
                        EntryLine::credit(merc_id, dec!(2000)),
                    ],
                ),
            ],
        );

        let income = &statements.income_statement;
        assert_eq!(income.sales.net_total, dec!(5000));
        assert_eq!(income.cost_of_goods_sold.net_total, dec!(-2000));
        assert_eq!(income.gross_profit, dec!(3000));
        assert_eq!(income.net_income, dec!(3000));
    }

    #[test]
    fn income_cascade_without_cogs() {
        let caja = Account::new("1.1.01", "Caja", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let ventas = Account::new("4.1.01", "Ventas", AccountKind::Income)
            .with_group(StatementGroup::Sales);
        let sueldos = Account::new("5.2.01", "Sueldos administración", AccountKind::Expense)
            .with_group(StatementGroup::AdminExpenses);
        let (caja_id, ventas_id, sueldos_id) = (caja.id, ventas.id, sueldos.id);

        let statements = statements_for(
            vec![caja, ventas, sueldos],
            vec![
                JournalEntry::new(
                    date(),
                    "Ventas del mes",
                    vec![
                        EntryLine::debit(caja_id, dec!(8000)),
                        EntryLine::credit(ventas_id, dec!(8000)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Sueldos",
                    vec![
                        EntryLine::debit(sueldos_id, dec!(3000)),
                        EntryLine::credit(caja_id, dec!(3000)),
                    ],
                ),
            ],
        );

        let income = &statements.income_statement;
        assert_eq!(income.gross_profit, dec!(8000));
        assert_eq!(income.operating_income, dec!(5000));
        assert_eq!(income.net_income, dec!(5000));
    }

    #[test]
    fn loss_case_yields_negative_net_income() {
        let caja = Account::new("1.1.01", "Caja", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let intereses = Account::new("4.2.01", "Intereses ganados", AccountKind::Income)
            .with_group(StatementGroup::FinancialResults);
        let gastos = Account::new("5.2.01", "Gastos varios", AccountKind::Expense)
            .with_group(StatementGroup::AdminExpenses);
        let (caja_id, int_id, gastos_id) = (caja.id, intereses.id, gastos.id);

        let statements = statements_for(
            vec![caja, intereses, gastos],
            vec![
                JournalEntry::new(
                    date(),
                    "Intereses",
                    vec![
                        EntryLine::debit(caja_id, dec!(1000)),
                        EntryLine::credit(int_id, dec!(1000)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Gastos",
                    vec![
                        EntryLine::debit(gastos_id, dec!(3000)),
                        EntryLine::credit(caja_id, dec!(3000)),
                    ],
                ),
            ],
        );

        assert_eq!(statements.income_statement.net_income, dec!(-2000));
    }

    #[test]
    fn balance_sheet_identity_includes_period_income() {
        let caja = Account::new("1.1.01", "Caja", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let capital = Account::new("3.1.01", "Capital social", AccountKind::Equity)
            .with_group(StatementGroup::Equity);
        let ventas = Account::new("4.1.01", "Ventas", AccountKind::Income)
            .with_group(StatementGroup::Sales);
        let (caja_id, capital_id, ventas_id) = (caja.id, capital.id, ventas.id);

        let statements = statements_for(
            vec![caja, capital, ventas],
            vec![
                JournalEntry::new(
                    date(),
                    "Aporte de capital",
                    vec![
                        EntryLine::debit(caja_id, dec!(10000)),
                        EntryLine::credit(capital_id, dec!(10000)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Venta de contado",
                    vec![
                        EntryLine::debit(caja_id, dec!(2000)),
                        EntryLine::credit(ventas_id, dec!(2000)),
                    ],
                ),
            ],
        );

        let bs = &statements.balance_sheet;
        assert_eq!(bs.total_assets, dec!(12000));
        assert_eq!(bs.total_liabilities, Decimal::ZERO);
        assert_eq!(bs.total_equity, dec!(12000));
        assert_eq!(bs.net_income, dec!(2000));
        assert!(bs.is_balanced);
    }

    #[test]
    fn zero_balance_accounts_stay_out_of_sections() {
        let caja = Account::new("1.1.01", "Caja", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let banco = Account::new("1.1.02", "Banco", AccountKind::Asset)
            .with_group(StatementGroup::CurrentAssets);
        let capital = Account::new("3.1.01", "Capital social", AccountKind::Equity)
            .with_group(StatementGroup::Equity);
        let (caja_id, banco_id, capital_id) = (caja.id, banco.id, capital.id);

        let statements = statements_for(
            vec![caja, banco, capital],
            vec![
                JournalEntry::new(
                    date(),
                    "Aporte",
                    vec![
                        EntryLine::debit(caja_id, dec!(1000)),
                        EntryLine::credit(capital_id, dec!(1000)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Depósito y extracción",
                    vec![
                        EntryLine::debit(banco_id, dec!(300)),
                        EntryLine::credit(caja_id, dec!(300)),
                    ],
                ),
                JournalEntry::new(
                    date(),
                    "Extracción",
                    vec![
                        EntryLine::debit(caja_id, dec!(300)),
                        EntryLine::credit(banco_id, dec!(300)),
                    ],
                ),
            ],
        );

        let current = &statements.balance_sheet.asset_sections[0];
        let codes: Vec<_> = current.lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, ["1.1.01"]);
    }
}
