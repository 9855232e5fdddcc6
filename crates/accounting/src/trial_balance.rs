//! Trial balance: the ledger summarized into balanced debit/credit columns.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use partida_core::{AccountId, is_within_tolerance};

use crate::chart::Chart;
use crate::ledger::Ledger;

/// Per-account sums, with the net balance split onto the side its sign
/// indicates (the other side stays zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub sum_debit: Decimal,
    pub sum_credit: Decimal,
    pub balance_debit: Decimal,
    pub balance_credit: Decimal,
}

/// Rows in chart-code order plus grand totals.
///
/// `is_balanced` must hold whenever the ledger was built only from validated
/// entries; a false value is a defect upstream, not a business condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
}

/// Pure read of the ledger: one row per posted account, aggregated totals.
pub fn compute_trial_balance(ledger: &Ledger, chart: &Chart) -> TrialBalance {
    let mut rows = Vec::with_capacity(ledger.len());
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for account in chart.iter() {
        let Some(ledger_account) = ledger.account(account.id) else {
            continue;
        };

        let net = ledger_account.total_debit - ledger_account.total_credit;
        let (balance_debit, balance_credit) = if net >= Decimal::ZERO {
            (net, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -net)
        };

        total_debit += ledger_account.total_debit;
        total_credit += ledger_account.total_credit;

        rows.push(TrialBalanceRow {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            sum_debit: ledger_account.total_debit,
            sum_credit: ledger_account.total_credit,
            balance_debit,
            balance_credit,
        });
    }

    let is_balanced = is_within_tolerance(total_debit - total_credit);
    if !is_balanced {
        // Only reachable by posting entries that skipped validation.
        tracing::error!(
            %total_debit,
            %total_credit,
            "trial balance does not balance; the ledger was built from unvalidated entries"
        );
    }

    TrialBalance {
        rows,
        total_debit,
        total_credit,
        is_balanced,
    }
}
