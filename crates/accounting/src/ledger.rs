//! Ledger aggregation: folding journal entries into per-account histories.
//!
//! Entries are processed in array order, not date order: running balances
//! reflect insertion sequence. The fold is total-or-nothing per entry: a bad
//! account reference aborts the posting before any of the entry's lines land.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use partida_core::{AccountId, EntryId};

use crate::chart::{Chart, ChartError, NormalSide};
use crate::journal::JournalEntry;

/// One posted line as seen from the account's side, with the running balance
/// after applying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMovement {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub memo: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub running_balance: Decimal,
}

/// Movement history and totals for a single account.
///
/// `balance` is positive on the account's normal side: debits minus credits
/// for debit-normal accounts, mirrored for credit-normal ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub account_id: AccountId,
    pub movements: Vec<LedgerMovement>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub balance: Decimal,
}

impl LedgerAccount {
    fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            movements: Vec::new(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }
}

/// Derived ledger: accountId → movement history. Freshly constructed per
/// computation; never mutated in place across independent computations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, LedgerAccount>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, id: AccountId) -> Option<&LedgerAccount> {
        self.accounts.get(&id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &LedgerAccount> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Grand totals over every account (the trial balance re-derives these).
    pub fn total_debit(&self) -> Decimal {
        self.accounts.values().map(|a| a.total_debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.accounts.values().map(|a| a.total_credit).sum()
    }
}

/// Fold a full entry sequence into a fresh ledger.
pub fn compute_ledger(entries: &[JournalEntry], chart: &Chart) -> Result<Ledger, ChartError> {
    entries
        .iter()
        .try_fold(Ledger::new(), |ledger, entry| post_entry(ledger, entry, chart))
}

/// Incremental variant: fold one additional entry into an existing ledger,
/// consuming and returning it.
pub fn post_entry(
    mut ledger: Ledger,
    entry: &JournalEntry,
    chart: &Chart,
) -> Result<Ledger, ChartError> {
    // Resolve every line before touching the ledger so a bad reference
    // cannot leave a partially posted entry behind.
    for line in &entry.lines {
        chart.ensure_postable(line.account_id)?;
    }

    for line in &entry.lines {
        let account = chart.ensure_postable(line.account_id)?;
        let ledger_account = ledger
            .accounts
            .entry(line.account_id)
            .or_insert_with(|| LedgerAccount::new(line.account_id));

        ledger_account.total_debit += line.debit;
        ledger_account.total_credit += line.credit;
        ledger_account.balance = match account.normal_side {
            NormalSide::Debit => ledger_account.total_debit - ledger_account.total_credit,
            NormalSide::Credit => ledger_account.total_credit - ledger_account.total_debit,
        };

        ledger_account.movements.push(LedgerMovement {
            entry_id: entry.id,
            date: entry.date,
            memo: entry.memo.clone(),
            debit: line.debit,
            credit: line.credit,
            running_balance: ledger_account.balance,
        });
    }

    Ok(ledger)
}
