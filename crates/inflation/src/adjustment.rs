//! Correcting journal entries for reexpressed accounts.
//!
//! The direction of a reexpression adjustment depends on the adjusted
//! account's normal side, never on an asset-shaped assumption: increasing a
//! debit-normal account debits it, increasing a credit-normal account
//! credits it, and the inflation-result (REI) account takes the mirror line.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partida_accounting::{Account, EntryLine, EntrySource, JournalEntry, NormalSide};
use partida_core::{AccountId, Period};

/// Inflation-result counterpart account (e.g. "RECPAM" / "REI").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultAccount(pub AccountId);

/// Build the correcting entry for one account's reexpression delta.
///
/// `delta` is the change in the account's balance measured on its own normal
/// side (positive = the balance grows). Returns `None` for a zero delta.
pub fn reexpression_adjustment_entry(
    account: &Account,
    delta: Decimal,
    result_account: ResultAccount,
    date: NaiveDate,
    period: Period,
) -> Option<JournalEntry> {
    if delta == Decimal::ZERO {
        return None;
    }

    let amount = delta.abs();
    let grow = delta > Decimal::ZERO;

    // Growing the balance posts on the account's normal side; shrinking posts
    // on the opposite side. The result account always mirrors.
    let account_side = if grow {
        account.normal_side
    } else {
        account.normal_side.opposite()
    };

    let (account_line, result_line) = match account_side {
        NormalSide::Debit => (
            EntryLine::debit(account.id, amount),
            EntryLine::credit(result_account.0, amount),
        ),
        NormalSide::Credit => (
            EntryLine::credit(account.id, amount),
            EntryLine::debit(result_account.0, amount),
        ),
    };

    let memo = format!("Ajuste por inflación {} ({})", period, account.name);
    Some(
        JournalEntry::new(date, memo, vec![account_line, result_line])
            .with_source(EntrySource::InflationAdjustment { period }),
    )
}
