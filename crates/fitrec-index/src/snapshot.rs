//! Persistence for `FlatIndex`.
//!
//! Two companion files: a bincode blob with the raw vector data and a JSON
//! mapping file `{item_mapping, dimension, updated_at}`. Both are written to
//! temporaries in the target directory and renamed into place, so a reader
//! never observes a half-written snapshot. Load treats a missing file as
//! "not persisted yet" and anything inconsistent as corrupt; the caller
//! decides to rebuild in either case.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use fitrec_core::error::SnapshotError;
use fitrec_core::types::ItemId;

use crate::flat::FlatIndex;

/// Locations of the two companion snapshot files.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    /// Bincode vector blob.
    pub blob: PathBuf,
    /// JSON id↔slot mapping file.
    pub mapping: PathBuf,
}

impl IndexPaths {
    /// Conventional file names under a data directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            blob: dir.join("index.bin"),
            mapping: dir.join("index.mapping.json"),
        }
    }
}

/// Raw vector data persisted in the blob file.
#[derive(Serialize, Deserialize)]
struct VectorBlob {
    dimension: usize,
    slot_to_item: Vec<ItemId>,
    vectors: Vec<f32>,
}

/// Companion mapping file.
///
/// `item_mapping` is keyed by item id and redundant with the blob's slot
/// order; the redundancy lets a load cross-check the two files against each
/// other before trusting either.
#[derive(Serialize, Deserialize)]
struct MappingFile {
    item_mapping: BTreeMap<i64, usize>,
    dimension: usize,
    updated_at: DateTime<Utc>,
}

impl FlatIndex {
    /// Persist the index to its two companion files.
    ///
    /// Atomic from the caller's point of view: each file is fully written to
    /// a temporary in the same directory, then swapped into place.
    pub fn persist(&self, paths: &IndexPaths) -> Result<(), SnapshotError> {
        let (dimension, vectors, slot_to_item) = self.parts_ref();
        let updated_at = Utc::now();

        let blob = VectorBlob {
            dimension,
            slot_to_item: slot_to_item.to_vec(),
            vectors: vectors.to_vec(),
        };
        write_atomic(&paths.blob, "writing index blob", |w| {
            bincode::serialize_into(w, &blob)
                .map_err(|e| SnapshotError::serialization("serializing index blob", e))
        })?;

        let mapping = MappingFile {
            item_mapping: slot_to_item
                .iter()
                .enumerate()
                .map(|(slot, id)| (id.0, slot))
                .collect(),
            dimension,
            updated_at,
        };
        write_atomic(&paths.mapping, "writing index mapping", |w| {
            serde_json::to_writer(w, &mapping)
                .map_err(|e| SnapshotError::serialization("serializing index mapping", e))
        })?;

        debug!(
            items = self.len(),
            dimension,
            blob = %paths.blob.display(),
            "persisted vector index"
        );
        Ok(())
    }

    /// Load a persisted index.
    ///
    /// Returns `Ok(None)` if either file is missing (nothing persisted yet).
    /// A file that exists but cannot be read, parsed, or cross-checked is an
    /// error; callers on the startup path log it and treat the state as
    /// absent rather than propagating into request handling.
    pub fn load(paths: &IndexPaths) -> Result<Option<(Self, DateTime<Utc>)>, SnapshotError> {
        if !paths.blob.exists() || !paths.mapping.exists() {
            return Ok(None);
        }

        let blob_file = File::open(&paths.blob)
            .map_err(|e| SnapshotError::io("opening index blob", e))?;
        let blob: VectorBlob = bincode::deserialize_from(BufReader::new(blob_file))
            .map_err(|e| SnapshotError::serialization("deserializing index blob", e))?;

        let mapping_file = File::open(&paths.mapping)
            .map_err(|e| SnapshotError::io("opening index mapping", e))?;
        let mapping: MappingFile = serde_json::from_reader(BufReader::new(mapping_file))
            .map_err(|e| SnapshotError::serialization("deserializing index mapping", e))?;

        cross_check(&blob, &mapping)?;

        let index = Self::from_parts(blob.dimension, blob.vectors, blob.slot_to_item);
        info!(
            items = index.len(),
            dimension = index.dimension(),
            updated_at = %mapping.updated_at,
            "loaded vector index"
        );
        Ok(Some((index, mapping.updated_at)))
    }
}

/// Verify the blob and mapping describe the same snapshot.
fn cross_check(blob: &VectorBlob, mapping: &MappingFile) -> Result<(), SnapshotError> {
    if blob.dimension == 0 {
        return Err(SnapshotError::Corrupt("zero dimension in blob".into()));
    }
    if blob.dimension != mapping.dimension {
        return Err(SnapshotError::Corrupt(format!(
            "dimension mismatch: blob {} vs mapping {}",
            blob.dimension, mapping.dimension
        )));
    }
    if blob.vectors.len() != blob.slot_to_item.len() * blob.dimension {
        return Err(SnapshotError::Corrupt(format!(
            "vector data length {} does not cover {} slots of dimension {}",
            blob.vectors.len(),
            blob.slot_to_item.len(),
            blob.dimension
        )));
    }
    if mapping.item_mapping.len() != blob.slot_to_item.len() {
        return Err(SnapshotError::Corrupt(format!(
            "mapping covers {} items but blob has {} slots",
            mapping.item_mapping.len(),
            blob.slot_to_item.len()
        )));
    }
    for (id, &slot) in &mapping.item_mapping {
        if blob.slot_to_item.get(slot).map(|i| i.0) != Some(*id) {
            return Err(SnapshotError::Corrupt(format!(
                "item {id} maps to slot {slot} but the blob disagrees"
            )));
        }
    }
    Ok(())
}

/// Write through a temp file in the target directory, then rename into place.
fn write_atomic<F>(path: &Path, context: &'static str, serialize: F) -> Result<(), SnapshotError>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<(), SnapshotError>,
{
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(|e| SnapshotError::io(context, e))?;

    {
        let mut writer = BufWriter::new(&mut tmp);
        serialize(&mut writer)?;
        writer.flush().map_err(|e| SnapshotError::io(context, e))?;
    }

    tmp.persist(path)
        .map_err(|e| SnapshotError::io(context, e.error))?;
    Ok(())
}
