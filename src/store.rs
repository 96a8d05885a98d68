//! Newline-delimited JSON dump of normalized entities.

use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::entity::NormalizedEntity;
use crate::error::Result;
use crate::TARGET_STORE;

/// Appends one JSON record per line, keys sorted.
pub struct NdjsonWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn append(&mut self, entity: &NormalizedEntity) -> Result<()> {
        // Going through `Value` keeps the keys in sorted order.
        let record = serde_json::to_value(entity)?;
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        debug!(target: TARGET_STORE, "Stored record: {}", entity);
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        info!(target: TARGET_STORE, "Stored {} records", self.written);
        Ok(self.out)
    }
}

/// Writes all entities, returning how many were written.
pub fn write_entities<'a, W, I>(out: W, entities: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a NormalizedEntity>,
{
    let mut writer = NdjsonWriter::new(out);
    for entity in entities {
        writer.append(entity)?;
    }
    let written = writer.written();
    writer.finish()?;
    Ok(written)
}

/// Reads a dump back, skipping blank lines.
pub fn read_entities<R: BufRead>(reader: R) -> Result<Vec<NormalizedEntity>> {
    let mut entities = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entities.push(serde_json::from_str(&line)?);
    }

    info!(target: TARGET_STORE, "Loaded {} records", entities.len());
    Ok(entities)
}
