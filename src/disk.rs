//! Disk space abstraction for the local free-space condition

use std::io;
use std::path::Path;

/// Trait for disk space queries
///
/// Allows different implementations for production (real disk) and testing (mock)
pub trait DiskOperations: Send + Sync {
    /// Space available to unprivileged users at `path`, in bytes
    fn free_space(&self, path: &Path) -> io::Result<u64>;
}

/// Real disk operations using fs2 (statvfs)
pub struct RealDisk;

impl RealDisk {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RealDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskOperations for RealDisk {
    fn free_space(&self, path: &Path) -> io::Result<u64> {
        fs2::statvfs(path).map(|stat| stat.available_space())
    }
}

/// Mock disk operations for testing
#[cfg(test)]
pub struct MockDisk {
    free: Option<u64>,
}

#[cfg(test)]
impl MockDisk {
    /// Disk reporting a fixed amount of free space for any path
    pub const fn new(free: u64) -> Self {
        Self { free: Some(free) }
    }

    /// Disk whose every query fails
    pub const fn failing() -> Self {
        Self { free: None }
    }
}

#[cfg(test)]
impl DiskOperations for MockDisk {
    fn free_space(&self, path: &Path) -> io::Result<u64> {
        self.free.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such mount: {}", path.display()),
            )
        })
    }
}
