//! # File I/O Module
//!
//! Handles invoice book file operations:
//! - **Atomic saves**: Write to .tmp, sync, rename so a crash never leaves a half-written book
//! - **File locking**: Only one workstation edits a shared book at a time
//! - **Locked edits**: [`with_locked_book`] re-reads the book under the lock before changing it
//! - **Version validation**: Refuse books written by an incompatible schema
//!
//! ## File Format
//!
//! Books are saved as `.bqi` files containing JSON.
//! Lock files use `.bqi.lock` extension with metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bore_core::file_io::{save_book, load_book, FileLock};
//! use bore_core::invoice_book::InvoiceBook;
//! use std::path::Path;
//!
//! let book = InvoiceBook::new("Sri Ganesh Borewells", "Ravi");
//! let path = Path::new("invoices.bqi");
//!
//! let lock = FileLock::acquire(path, "ravi")?;
//! save_book(&book, path)?;
//! drop(lock);
//!
//! let loaded = load_book(path)?;
//! # Ok::<(), bore_core::errors::BoreError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{BoreError, BoreResult};
use crate::invoice_book::{InvoiceBook, SCHEMA_VERSION};

/// Lock file metadata stored in .bqi.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Who holds the lock (operator name or login)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Stale locks belong to a dead process on this machine, or are older than a day.
    pub fn is_stale(&self) -> bool {
        if hostname().as_deref() == Some(self.machine.as_str()) && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > 24
    }
}

fn hostname() -> Option<String> {
    whoami::fallible::hostname().ok()
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(target_os = "linux", windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive lock on a book, released when dropped.
///
/// Combines an OS-level lock (fs2) with a `.lock` sidecar describing the
/// holder, so other operators see who has the book open.
pub struct FileLock {
    book_path: PathBuf,
    lock_path: PathBuf,
    // Held for the OS lock
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a book file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(BoreError::FileLocked)` - Another live process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> BoreResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = read_lock_info(&lock_path) {
            if !existing.is_stale() {
                return Err(BoreError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", existing.user_id, existing.machine),
                    existing.locked_at.to_rfc3339(),
                ));
            }
            warn!(
                path = %path.display(),
                holder = %existing.user_id,
                "taking over stale lock"
            );
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| {
                BoreError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        lock_file.try_lock_exclusive().map_err(|_| {
            BoreError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(BoreError::serialization)?;
        lock_file.write_all(lock_json.as_bytes()).map_err(|e| {
            BoreError::file_error("write lock", lock_path.display().to_string(), e.to_string())
        })?;
        lock_file.sync_all().map_err(|e| {
            BoreError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        debug!(path = %path.display(), user = %info.user_id, "lock acquired");
        Ok(FileLock {
            book_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a book is locked without acquiring the lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !info.is_stale())
    }

    pub fn book_path(&self) -> &Path {
        &self.book_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        debug!(path = %self.book_path.display(), "lock released");
    }
}

fn lock_path_for(book_path: &Path) -> PathBuf {
    let mut lock_path = book_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

/// Unreadable or malformed sidecars count as "no lock".
fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save a book with atomic write semantics.
///
/// 1. Serialize to pretty JSON
/// 2. Write to `<name>.bqi.tmp` and fsync
/// 3. Rename over the target
pub fn save_book(book: &InvoiceBook, path: &Path) -> BoreResult<()> {
    let json = serde_json::to_string_pretty(book).map_err(BoreError::serialization)?;

    let tmp_path = path.with_extension("bqi.tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        BoreError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        BoreError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        BoreError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        BoreError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(
        path = %path.display(),
        invoices = book.invoice_count(),
        profiles = book.profiles.len(),
        "book saved"
    );
    Ok(())
}

/// Load a book from a file.
///
/// # Returns
///
/// * `Ok(InvoiceBook)` - Successfully loaded book
/// * `Err(BoreError::VersionMismatch)` - File version is incompatible
/// * `Err(BoreError::SerializationError)` - Invalid JSON
/// * `Err(BoreError::FileError)` - I/O error
pub fn load_book(path: &Path) -> BoreResult<InvoiceBook> {
    let contents = fs::read_to_string(path)
        .map_err(|e| BoreError::file_error("read", path.display().to_string(), e.to_string()))?;

    let book: InvoiceBook = serde_json::from_str(&contents).map_err(|e| {
        BoreError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    validate_version(&book.meta.version)?;

    info!(path = %path.display(), invoices = book.invoice_count(), "book loaded");
    Ok(book)
}

/// Load a book, or start a new one if the file does not exist yet.
pub fn load_or_create_book(
    path: &Path,
    business_name: &str,
    owner: &str,
) -> BoreResult<InvoiceBook> {
    if path.exists() {
        load_book(path)
    } else {
        debug!(path = %path.display(), "no book on disk, starting a new one");
        Ok(InvoiceBook::new(business_name, owner))
    }
}

/// Edit a book on disk under its lock.
///
/// Takes the lock first, then reads the current file (or starts a new
/// book), applies `edit` and saves. Edits from other workstations made
/// before the lock was taken are never overwritten.
///
/// # Returns
///
/// * `Ok(T)` - Whatever `edit` returned, after the book was saved
/// * `Err(BoreError::FileLocked)` - Another live process holds the lock
pub fn with_locked_book<T>(
    path: &Path,
    user_id: &str,
    business_name: &str,
    owner: &str,
    edit: impl FnOnce(&mut InvoiceBook) -> T,
) -> BoreResult<T> {
    let _lock = FileLock::acquire(path, user_id)?;
    let mut book = load_or_create_book(path, business_name, owner)?;
    let out = edit(&mut book);
    save_book(&book, path)?;
    Ok(out)
}

/// Load a book along with the lock holder, if someone else has it open.
pub fn load_book_with_lock_check(path: &Path) -> BoreResult<(InvoiceBook, Option<LockInfo>)> {
    let book = load_book(path)?;
    let lock_info = FileLock::check(path);
    Ok((book, lock_info))
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> BoreResult<()> {
    let mismatch = || BoreError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // 0.x: a newer minor may carry breaking changes
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(mismatch());
    }

    Ok(())
}
