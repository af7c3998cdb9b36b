use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".lock";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("timed out waiting for {path}: another td process is writing")]
    Timeout { path: PathBuf },
}

/// Exclusive advisory lock on a data directory, held for one
/// load-mutate-save cycle of the CLI. Released on drop.
#[derive(Debug)]
pub struct DeckLock {
    _file: File,
    path: PathBuf,
}

impl DeckLock {
    /// Take the lock without waiting. `Ok(None)` if another process holds it.
    fn try_acquire(data_dir: &Path) -> Result<Option<Self>, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = open_lock_file(&path)?;
        if flock_exclusive(&file).is_ok() {
            Ok(Some(DeckLock { _file: file, path }))
        } else {
            Ok(None)
        }
    }

    /// Take the lock, retrying until `timeout` elapses.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let start = Instant::now();
        let mut contended = false;
        loop {
            if let Some(lock) = Self::try_acquire(data_dir)? {
                if contended {
                    tracing::debug!(waited_ms = start.elapsed().as_millis() as u64, "lock acquired");
                }
                return Ok(lock);
            }
            if !contended {
                tracing::debug!(dir = %data_dir.display(), "lock busy, waiting");
                contended = true;
            }
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: data_dir.join(LOCK_FILE),
                });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
    }

    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_TIMEOUT)
    }
}

impl Drop for DeckLock {
    fn drop(&mut self) {
        // flock is released with the descriptor
        let _ = fs::remove_file(&self.path);
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| LockError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LockError::Open {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}
