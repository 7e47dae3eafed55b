/*!
 * Output side of a run.
 *
 * - `ledger`: which units are already complete
 * - `writer`: appends a completed unit's records and commits it
 * - `commit_log`: per-unit commit markers next to the output store
 * - `recovery`: cuts uncommitted output left by an interrupted run
 */

pub mod commit_log;
pub mod ledger;
pub mod recovery;
pub mod writer;

pub use commit_log::{CommitLog, CommitMarker, TailRepair};
pub use ledger::CompletionLedger;
pub use recovery::{RecoveryReport, recover};
pub use writer::{AppendOutcome, ResultWriter};
