//! Chart of accounts: static, hierarchical account descriptions.
//!
//! The chart is built by an external editor and is immutable during a single
//! computation pass. Header accounts are structural and never receive
//! postings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use partida_core::AccountId;

/// High-level account kind (determines the default normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountKind {
    /// Side on which this kind's balance is conventionally positive.
    pub fn normal_side(self) -> NormalSide {
        match self {
            AccountKind::Asset | AccountKind::Expense => NormalSide::Debit,
            AccountKind::Liability | AccountKind::Equity | AccountKind::Income => {
                NormalSide::Credit
            }
        }
    }
}

/// The side (debit/credit) on which an account's balance is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    Debit,
    Credit,
}

impl NormalSide {
    pub fn opposite(self) -> Self {
        match self {
            NormalSide::Debit => NormalSide::Credit,
            NormalSide::Credit => NormalSide::Debit,
        }
    }
}

/// Statement section an account is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementGroup {
    CurrentAssets,
    NonCurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    Equity,
    Sales,
    CostOfGoodsSold,
    AdminExpenses,
    SellingExpenses,
    FinancialResults,
    OtherResults,
}

impl StatementGroup {
    /// Whether the group belongs to the balance sheet (vs the income statement).
    pub fn is_balance_sheet(self) -> bool {
        matches!(
            self,
            StatementGroup::CurrentAssets
                | StatementGroup::NonCurrentAssets
                | StatementGroup::CurrentLiabilities
                | StatementGroup::NonCurrentLiabilities
                | StatementGroup::Equity
        )
    }

    /// Side on which this section's balances are presented as positive.
    ///
    /// Asset sections present debit-positive; every other section (including
    /// all income-statement sections) presents credit-positive, which is what
    /// makes the income cascade pure addition.
    pub fn presentation_side(self) -> NormalSide {
        match self {
            StatementGroup::CurrentAssets | StatementGroup::NonCurrentAssets => NormalSide::Debit,
            _ => NormalSide::Credit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatementGroup::CurrentAssets => "Activo corriente",
            StatementGroup::NonCurrentAssets => "Activo no corriente",
            StatementGroup::CurrentLiabilities => "Pasivo corriente",
            StatementGroup::NonCurrentLiabilities => "Pasivo no corriente",
            StatementGroup::Equity => "Patrimonio neto",
            StatementGroup::Sales => "Ventas",
            StatementGroup::CostOfGoodsSold => "Costo de ventas",
            StatementGroup::AdminExpenses => "Gastos de administración",
            StatementGroup::SellingExpenses => "Gastos de comercialización",
            StatementGroup::FinancialResults => "Resultados financieros",
            StatementGroup::OtherResults => "Otros resultados",
        }
    }
}

/// An account in the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Dot-hierarchical code, e.g. `"1.1.02.02"`.
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    /// Defaults to the kind's side; overridden for contra accounts.
    pub normal_side: NormalSide,
    pub is_contra: bool,
    /// Structural grouping account; never receives postings.
    pub is_header: bool,
    pub parent_id: Option<AccountId>,
    /// Used only by the statement assembler; `None` keeps the account out of
    /// the statements.
    pub statement_group: Option<StatementGroup>,
}

impl Account {
    pub fn new(code: impl Into<String>, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            kind,
            normal_side: kind.normal_side(),
            is_contra: false,
            is_header: false,
            parent_id: None,
            statement_group: None,
        }
    }

    /// Mark as a contra account: the normal side flips to the opposite of the
    /// kind's default (e.g. accumulated depreciation is a credit-normal asset).
    pub fn contra(mut self) -> Self {
        self.is_contra = true;
        self.normal_side = self.kind.normal_side().opposite();
        self
    }

    /// Mark as a structural header account (non-postable).
    pub fn header(mut self) -> Self {
        self.is_header = true;
        self
    }

    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_group(mut self, group: StatementGroup) -> Self {
        self.statement_group = Some(group);
        self
    }
}

/// Posting-time reference failures against the chart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("account {code} is a header account and cannot receive postings")]
    HeaderAccount { account_id: AccountId, code: String },
}

/// Read-only lookup collection over the chart of accounts.
///
/// Iteration order is by account code, so derived reports come out in chart
/// order regardless of input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Account>", into = "Vec<Account>")]
pub struct Chart {
    accounts: Vec<Account>,
    by_id: HashMap<AccountId, usize>,
}

impl From<Vec<Account>> for Chart {
    fn from(accounts: Vec<Account>) -> Self {
        Self::new(accounts)
    }
}

impl From<Chart> for Vec<Account> {
    fn from(chart: Chart) -> Self {
        chart.accounts
    }
}

impl Chart {
    pub fn new(mut accounts: Vec<Account>) -> Self {
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        let by_id = accounts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();
        Self { accounts, by_id }
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.by_id.get(&id).map(|&i| &self.accounts[i])
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Resolve an account for posting, rejecting unknown ids and headers.
    pub fn ensure_postable(&self, id: AccountId) -> Result<&Account, ChartError> {
        let account = self.get(id).ok_or(ChartError::AccountNotFound(id))?;
        if account.is_header {
            return Err(ChartError::HeaderAccount {
                account_id: id,
                code: account.code.clone(),
            });
        }
        Ok(account)
    }

    /// Accounts in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
