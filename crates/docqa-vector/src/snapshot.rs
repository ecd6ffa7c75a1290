//! On-disk snapshot of the index and its chunk metadata.
//!
//! Both artifacts of one snapshot live in a generation directory; the
//! `CURRENT` file names the active generation:
//!
//! ```text
//! <root>/CURRENT           -> "gen-00000003"
//! <root>/gen-00000003/manifest.json
//! <root>/gen-00000003/vectors.bin
//! <root>/gen-00000003/chunks.json
//! ```
//!
//! Publishing writes and fsyncs a fresh generation, then replaces `CURRENT`
//! with a rename. A reader therefore sees either the previous pair or the new
//! pair, never one half of each. Superseded generations are pruned afterwards.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use docqa_core::types::Chunk;

use crate::error::SnapshotError;
use crate::index::FlatL2Index;

pub const FORMAT_VERSION: u32 = 1;

const CURRENT: &str = "CURRENT";
const MANIFEST: &str = "manifest.json";
const VECTORS: &str = "vectors.bin";
const CHUNKS: &str = "chunks.json";
const GENERATION_PREFIX: &str = "gen-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub generation: u64,
    pub dim: usize,
    pub count: usize,
    pub embedder_id: String,
    pub vectors_blake3: String,
    pub chunks_blake3: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub manifest: Manifest,
    pub index: FlatL2Index,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

fn generation_name(generation: u64) -> String {
    format!("{GENERATION_PREFIX}{generation:08}")
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let mut file = File::create(path).map_err(SnapshotError::io(path))?;
    file.write_all(bytes).map_err(SnapshotError::io(path))?;
    file.sync_all().map_err(SnapshotError::io(path))
}

fn read(path: &Path) -> Result<Vec<u8>, SnapshotError> {
    fs::read(path).map_err(SnapshotError::io(path))
}

impl SnapshotDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generation named by `CURRENT`, if any.
    pub fn current_generation(&self) -> Result<Option<u64>, SnapshotError> {
        let path = self.root.join(CURRENT);
        if !path.exists() {
            return Ok(None);
        }
        let name = fs::read_to_string(&path).map_err(SnapshotError::io(&path))?;
        parse_generation(name.trim())
            .map(Some)
            .ok_or_else(|| SnapshotError::Inconsistent(format!("CURRENT names an invalid generation '{}'", name.trim())))
    }

    /// Generation numbers of every generation directory present, ascending.
    fn generations(&self) -> Result<Vec<u64>, SnapshotError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut out: Vec<u64> = fs::read_dir(&self.root)
            .map_err(SnapshotError::io(&self.root))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| parse_generation(&e.file_name().to_string_lossy()))
            .collect();
        out.sort_unstable();
        Ok(out)
    }

    /// Load the active snapshot. `Ok(None)` when nothing was ever published.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let Some(generation) = self.current_generation()? else { return Ok(None) };
        let dir = self.root.join(generation_name(generation));

        let manifest: Manifest = serde_json::from_slice(&read(&dir.join(MANIFEST))?)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(SnapshotError::Inconsistent(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }

        let vector_bytes = read(&dir.join(VECTORS))?;
        if hash_bytes(&vector_bytes) != manifest.vectors_blake3 {
            return Err(SnapshotError::Checksum { artifact: VECTORS });
        }
        let (index, _): (FlatL2Index, usize) = bincode::decode_from_slice(&vector_bytes, bincode::config::standard())?;

        let chunk_bytes = read(&dir.join(CHUNKS))?;
        if hash_bytes(&chunk_bytes) != manifest.chunks_blake3 {
            return Err(SnapshotError::Checksum { artifact: CHUNKS });
        }
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunk_bytes)?;

        let (dim, data) = index.raw_parts();
        if let Some(d) = dim {
            if d == 0 || data.len() % d != 0 || d != manifest.dim {
                return Err(SnapshotError::Inconsistent(format!(
                    "vector blob of {} floats does not fit dimension {} (manifest {})",
                    data.len(),
                    d,
                    manifest.dim
                )));
            }
        }
        if index.len() != chunks.len() || chunks.len() != manifest.count {
            return Err(SnapshotError::Inconsistent(format!(
                "{} vectors, {} chunks, manifest count {}",
                index.len(),
                chunks.len(),
                manifest.count
            )));
        }
        debug!(generation, count = chunks.len(), "snapshot loaded");
        Ok(Some(Snapshot { manifest, index, chunks }))
    }

    /// Write `index` + `chunks` as a new generation and make it current.
    pub fn publish(&self, index: &FlatL2Index, chunks: &[Chunk], embedder_id: &str) -> Result<Manifest, SnapshotError> {
        if index.len() != chunks.len() {
            return Err(SnapshotError::Inconsistent(format!(
                "refusing to publish {} vectors with {} chunks",
                index.len(),
                chunks.len()
            )));
        }
        fs::create_dir_all(&self.root).map_err(SnapshotError::io(&self.root))?;

        let current = self.current_generation().ok().flatten().unwrap_or(0);
        let newest = self.generations()?.last().copied().unwrap_or(0);
        let generation = current.max(newest) + 1;
        let dir = self.root.join(generation_name(generation));

        match self.write_generation(&dir, generation, index, chunks, embedder_id) {
            Ok(manifest) => {
                info!(generation, count = manifest.count, dir = %self.root.display(), "snapshot published");
                self.prune(generation);
                Ok(manifest)
            }
            Err(err) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    debug!(error = %cleanup, dir = %dir.display(), "could not remove unpublished generation");
                }
                Err(err)
            }
        }
    }

    fn write_generation(
        &self,
        dir: &Path,
        generation: u64,
        index: &FlatL2Index,
        chunks: &[Chunk],
        embedder_id: &str,
    ) -> Result<Manifest, SnapshotError> {
        fs::create_dir(dir).map_err(SnapshotError::io(dir))?;

        let vector_bytes = bincode::encode_to_vec(index, bincode::config::standard())?;
        let chunk_bytes = serde_json::to_vec_pretty(chunks)?;
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            generation,
            dim: index.dim().unwrap_or(0),
            count: chunks.len(),
            embedder_id: embedder_id.to_string(),
            vectors_blake3: hash_bytes(&vector_bytes),
            chunks_blake3: hash_bytes(&chunk_bytes),
            created_at: Utc::now(),
        };
        write_synced(&dir.join(VECTORS), &vector_bytes)?;
        write_synced(&dir.join(CHUNKS), &chunk_bytes)?;
        write_synced(&dir.join(MANIFEST), &serde_json::to_vec_pretty(&manifest)?)?;
        // directory fsync is not supported everywhere
        if let Ok(handle) = File::open(dir) {
            let _ = handle.sync_all();
        }

        let current_path = self.root.join(CURRENT);
        let mut pointer = NamedTempFile::new_in(&self.root).map_err(SnapshotError::io(&self.root))?;
        writeln!(pointer, "{}", generation_name(generation)).map_err(SnapshotError::io(pointer.path()))?;
        pointer.as_file().sync_all().map_err(SnapshotError::io(pointer.path()))?;
        pointer.persist(&current_path).map_err(|e| SnapshotError::Io { path: current_path.clone(), source: e.error })?;
        Ok(manifest)
    }

    /// Remove every generation other than `keep`. Failures are logged only:
    /// the published snapshot is already durable.
    fn prune(&self, keep: u64) {
        let generations = match self.generations() {
            Ok(g) => g,
            Err(err) => {
                warn!(error = %err, "could not list snapshot generations");
                return;
            }
        };
        for generation in generations.into_iter().filter(|g| *g != keep) {
            let dir = self.root.join(generation_name(generation));
            if let Err(err) = fs::remove_dir_all(&dir) {
                warn!(error = %err, dir = %dir.display(), "could not prune old snapshot generation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> (FlatL2Index, Vec<Chunk>) {
        let mut index = FlatL2Index::new();
        let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32, 1.0]).collect();
        index.add(&vectors).unwrap();
        let chunks = (0..n)
            .map(|i| Chunk { id: i as u64, text: format!("chunk {i}"), document: "doc".into(), page: 1 })
            .collect();
        (index, chunks)
    }

    #[test]
    fn missing_snapshot_loads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(SnapshotDir::new(tmp.path().join("nope")).load().unwrap().is_none());
    }

    #[test]
    fn publish_then_load_and_prune() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SnapshotDir::new(tmp.path());
        let (index, chunks) = sample(2);
        assert_eq!(dir.publish(&index, &chunks, "test").unwrap().generation, 1);
        let (index, chunks) = sample(3);
        let manifest = dir.publish(&index, &chunks, "test").unwrap();
        assert_eq!(manifest.generation, 2);
        assert_eq!(dir.generations().unwrap(), vec![2]);

        let snap = dir.load().unwrap().unwrap();
        assert_eq!(snap.chunks, chunks);
        assert_eq!(snap.index, index);
        assert_eq!(snap.manifest.dim, 2);
    }

    #[test]
    fn refuses_to_publish_mismatched_halves() {
        let tmp = tempfile::tempdir().unwrap();
        let (index, mut chunks) = sample(2);
        chunks.pop();
        assert!(matches!(
            SnapshotDir::new(tmp.path()).publish(&index, &chunks, "test"),
            Err(SnapshotError::Inconsistent(_))
        ));
    }

    #[test]
    fn half_written_generation_leaves_previous_current() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SnapshotDir::new(tmp.path());
        let (index, chunks) = sample(1);
        dir.publish(&index, &chunks, "test").unwrap();

        let partial = tmp.path().join(generation_name(2));
        fs::create_dir(&partial).unwrap();
        fs::write(partial.join(VECTORS), b"partial").unwrap();

        let snap = dir.load().unwrap().unwrap();
        assert_eq!(snap.manifest.generation, 1);
        assert_eq!(snap.chunks.len(), 1);

        let (index, chunks) = sample(2);
        assert_eq!(dir.publish(&index, &chunks, "test").unwrap().generation, 3);
        assert_eq!(dir.generations().unwrap(), vec![3]);
        assert_eq!(dir.load().unwrap().unwrap().chunks, chunks);
    }

    #[test]
    fn tampered_chunks_fail_checksum() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SnapshotDir::new(tmp.path());
        let (index, chunks) = sample(2);
        dir.publish(&index, &chunks, "test").unwrap();
        fs::write(tmp.path().join(generation_name(1)).join(CHUNKS), "[]").unwrap();
        assert!(matches!(dir.load(), Err(SnapshotError::Checksum { artifact: CHUNKS })));
    }
}
