//! Accounting module (double-entry journal, ledger, trial balance, statements).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Every
//! entry point takes read-only input collections and returns a freshly
//! constructed result; nothing is mutated in place across calls.

pub mod chart;
pub mod journal;
pub mod ledger;
pub mod statements;
pub mod trial_balance;


pub use chart::{Account, AccountKind, Chart, ChartError, NormalSide, StatementGroup};
pub use journal::{EntryLine, EntrySource, JournalEntry, ValidationError, ValidationReport, validate};
pub use ledger::{Ledger, LedgerAccount, LedgerMovement, compute_ledger, post_entry};
pub use statements::{
    BalanceSheet, IncomeStatement, StatementLine, StatementSection, Statements, compute_statements,
};
pub use trial_balance::{TrialBalance, TrialBalanceRow, compute_trial_balance};
