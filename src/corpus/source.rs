/*!
 * Lazy reader over the input store.
 *
 * Yields one work unit per line, together with the line's 0-based position.
 * Lines before the configured offset are read past without being decoded, so
 * positions stay exact while a sharded run pays nothing for the prefix.
 */

use log::debug;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::StoreError;

use super::unit::{SchemaMapping, WorkUnit};

/// A work unit and its position in the input store
#[derive(Debug, Clone)]
pub struct SourcedUnit {
    /// 0-based ordinal of the record
    pub position: usize,
    /// The decoded unit
    pub unit: WorkUnit,
}

/// Iterator over the records of an input store
pub struct UnitSource {
    path: PathBuf,
    reader: BufReader<File>,
    schema: SchemaMapping,
    include_attribute: bool,
    offset: usize,
    position: usize,
    skipped: usize,
    buf: String,
    done: bool,
}

impl UnitSource {
    /// Open an input store
    pub fn open<P: AsRef<Path>>(
        path: P,
        schema: SchemaMapping,
        include_attribute: bool,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| StoreError::read(format!("opening input store {}", path.display()), e))?;

        Ok(Self {
            path,
            reader: BufReader::new(file),
            schema,
            include_attribute,
            offset: 0,
            position: 0,
            skipped: 0,
            buf: String::new(),
            done: false,
        })
    }

    /// Skip the first `offset` records unconditionally
    pub fn starting_at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Records read past because they sit before the offset
    pub fn skipped_before_offset(&self) -> usize {
        self.skipped
    }

    /// Read the next raw line; `None` at end of store
    fn next_line(&mut self) -> Option<Result<(), StoreError>> {
        self.buf.clear();
        match self.reader.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(())),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Some(Err(StoreError::malformed(
                &self.path,
                self.position + 1,
                "line is not valid UTF-8",
            ))),
            Err(e) => Some(Err(StoreError::read(
                format!("reading input store {}", self.path.display()),
                e,
            ))),
        }
    }

    fn decode_current(&self) -> Result<WorkUnit, StoreError> {
        let line = self.position + 1;
        let record: Value = serde_json::from_str(self.buf.trim_end_matches(['\n', '\r']))
            .map_err(|e| StoreError::malformed(&self.path, line, e.to_string()))?;

        WorkUnit::from_record(record, &self.schema, self.include_attribute)
            .map_err(|reason| StoreError::malformed(&self.path, line, reason))
    }
}

impl Iterator for UnitSource {
    type Item = Result<SourcedUnit, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.next_line() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(())) => {}
            }

            let position = self.position;
            if position < self.offset {
                self.position += 1;
                self.skipped += 1;
                continue;
            }

            let result = self.decode_current();
            self.position += 1;

            return Some(match result {
                Ok(unit) => {
                    debug!("Read unit {} at position {}", unit.id, position);
                    Ok(SourcedUnit { position, unit })
                }
                Err(e) => {
                    self.done = true;
                    Err(e)
                }
            });
        }
    }
}
