/*!
 * Input side: work units, the schema mapping that reads them, and the
 * lazy unit source over the input store.
 */

pub mod source;
pub mod unit;

pub use source::{SourcedUnit, UnitSource};
pub use unit::{Document, SchemaMapping, UnitId, WorkUnit};
