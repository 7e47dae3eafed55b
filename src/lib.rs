/*!
 * # talkalign - resumable parallel-corpus alignment
 *
 * A Rust library for turning a JSON-lines store of multilingual talk
 * transcripts into a JSON-lines store of aligned sentence pairs.
 *
 * ## Features
 *
 * - Lazy, line-by-line reading of the input store
 * - Resumable runs: units already in the output store are never redone
 * - Per-unit commit markers and orphan recovery after a crash
 * - Unit quota and offset for sharded or incremental runs
 * - Pluggable aligners:
 *   - HTTP alignment service
 *   - Positional mock, for dry runs and tests
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `corpus`: Input records and the lazy unit source
 * - `alignment`: The aligner seam and its implementations
 * - `store`: Output side of a run:
 *   - `store::ledger`: Completed units
 *   - `store::writer`: Appending and committing records
 *   - `store::commit_log`: Commit markers
 *   - `store::recovery`: Cutting uncommitted output
 * - `app_controller`: Main run controller
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod corpus;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod store;

// Re-export main types for easier usage
pub use alignment::{AlignedPair, Aligner, AlignmentParams, HttpAligner, MockAligner};
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary, StopReason, StoreStatus};
pub use corpus::{Document, SchemaMapping, UnitId, UnitSource, WorkUnit};
pub use errors::{AlignerError, AppError, StoreError};
pub use language_utils::{get_language_name, language_codes_match};
