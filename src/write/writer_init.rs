//! Writer initialization and finalization.
//!
//! This module provides methods for creating writers and finishing package
//! writing, including patching the index location into the header.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::format::offsets;
use crate::{Error, Result};

use super::options::{WriteOptions, WriteResult};
use super::{Writer, WriterState, to_u32};

impl Writer<BufWriter<File>> {
    /// Creates a new package file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>, options: &WriteOptions) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::with_options(BufWriter::new(file), options)
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Creates a new package writer with default options.
    ///
    /// The header is written immediately, with the index fields zeroed.
    pub fn create(sink: W) -> Result<Self> {
        Self::with_options(sink, &WriteOptions::default())
    }

    /// Creates a new package writer.
    ///
    /// The package starts at the sink's current position; entry offsets are
    /// relative to it.
    pub fn with_options(mut sink: W, options: &WriteOptions) -> Result<Self> {
        let base = sink.stream_position()?;
        sink.write_all(&options.initial_header().to_bytes())?;

        Ok(Self {
            sink,
            base,
            state: WriterState::AcceptingEntries,
            entries: Vec::new(),
            data_size: 0,
        })
    }

    /// Finishes writing the package.
    pub fn finish(self) -> Result<WriteResult> {
        let (result, _sink) = self.finish_into_inner()?;
        Ok(result)
    }

    /// Finishes writing the package and returns the underlying sink.
    ///
    /// The sink is left positioned at the end of the package.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, W)> {
        self.ensure_accepting_entries()?;
        match self.write_index() {
            Ok(result) => {
                self.state = WriterState::Finished;
                log::debug!(
                    "finished package: {} entries, index at {:#x}",
                    result.entries_written,
                    result.index_offset
                );
                Ok((result, self.sink))
            }
            Err(e) => {
                self.state = WriterState::Failed;
                Err(e)
            }
        }
    }

    fn write_index(&mut self) -> Result<WriteResult> {
        let index_offset = to_u32(self.relative_position()?)?;
        let mut index = Vec::with_capacity(self.entries.len() * crate::format::INDEX_ENTRY_SIZE);
        for entry in &self.entries {
            index.extend_from_slice(&entry.to_bytes());
        }
        let index_size = to_u32(index.len() as u64)?;
        let index_count = to_u32(self.entries.len() as u64)?;
        self.sink.write_all(&index)?;
        let end = self.sink.stream_position()?;
        to_u32(end - self.base)?;

        // second pass: count, offset and size are contiguous in the header
        let mut patch = [0u8; 12];
        patch[0..4].copy_from_slice(&index_count.to_le_bytes());
        patch[4..8].copy_from_slice(&index_offset.to_le_bytes());
        patch[8..12].copy_from_slice(&index_size.to_le_bytes());
        self.sink
            .seek(SeekFrom::Start(self.base + offsets::INDEX_COUNT as u64))?;
        self.sink.write_all(&patch)?;
        self.sink.seek(SeekFrom::Start(end))?;
        self.sink.flush()?;

        Ok(WriteResult {
            entries_written: self.entries.len(),
            data_size: self.data_size,
            index_offset,
            index_size,
            total_size: end - self.base,
        })
    }

    /// Ensures the writer is in the AcceptingEntries state.
    pub(crate) fn ensure_accepting_entries(&self) -> Result<()> {
        if self.state != WriterState::AcceptingEntries {
            return Err(Error::InvalidFormat(
                "Writer is not accepting entries".into(),
            ));
        }
        Ok(())
    }
}
