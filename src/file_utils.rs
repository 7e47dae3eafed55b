use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

// @module: File utilities for the JSONL stores

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Create an empty file (and its parent directory) if it does not exist
    ///
    /// Existing content is never touched.
    pub fn ensure_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(())
    }

    /// Length of a file in bytes, zero when it does not exist
    pub fn file_len<P: AsRef<Path>>(path: P) -> io::Result<u64> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Length of a file up to and including its last newline
    ///
    /// Zero when the file is missing or holds no newline at all.
    pub fn terminated_len<P: AsRef<Path>>(path: P) -> io::Result<u64> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut end = file.metadata()?.len();
        let mut buf = [0u8; 8192];
        while end > 0 {
            let start = end.saturating_sub(buf.len() as u64);
            let chunk = &mut buf[..(end - start) as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(chunk)?;
            if let Some(i) = chunk.iter().rposition(|b| *b == b'\n') {
                return Ok(start + i as u64 + 1);
            }
            end = start;
        }
        Ok(0)
    }

    /// Cut a file back to `len` bytes and sync it
    pub fn truncate_to<P: AsRef<Path>>(path: P, len: u64) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(len)?;
        file.sync_all()
    }

    /// Path of a sidecar file next to `path`, e.g. `out.jsonl` -> `out.jsonl.commits.jsonl`
    pub fn sidecar_path<P: AsRef<Path>>(path: P, suffix: &str) -> PathBuf {
        let path = path.as_ref();
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        path.with_file_name(name)
    }
}
