//! Runtime abstraction for system operations.
//!
//! Stores and the install-path manager never touch `std::fs` or the process
//! environment directly; they go through [`Runtime`], which lets unit tests
//! swap in a `MockRuntime`.
//!
//! # Structure
//!
//! - `path` - Path helpers (relative symlink targets)
//! - `env` - Environment variables, home and working directories
//! - `fs` - File system operations, including the exclusive-create primitives
//! - `symlink` - Symlink operations (create, read, remove)

mod env;
mod fs;
pub mod path;
mod symlink;

use anyhow::Result;
use async_trait::async_trait;
use std::env as std_env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use path::relative_symlink_path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn env_vars(&self) -> Vec<(String, String)>;
    fn current_dir(&self) -> Result<PathBuf>;
    fn home_dir(&self) -> Option<PathBuf>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Write a file that must not exist yet. Fails with `AlreadyExists` otherwise.
    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()>;

    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copy `from` to `to`, failing with `AlreadyExists` if `to` is present.
    fn copy_new(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Create a single directory. The parent must exist and the directory must not.
    fn create_dir(&self, path: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_symlink(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_symlink(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Create a file for streaming writes. Fails if the file already exists.
    fn create_file_new(&self, path: &Path) -> Result<Box<dyn io::Write + Send>>;

    fn open(&self, path: &Path) -> Result<Box<dyn io::Read + Send>>;

    /// Last modification time, without following symlinks.
    fn modified(&self, path: &Path) -> Result<SystemTime>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn env_vars(&self) -> Vec<(String, String)> {
        self.env_vars_impl()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_new_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn copy_new(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_new_impl(from, to)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.create_dir_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn remove_symlink(&self, path: &Path) -> Result<()> {
        self.remove_symlink_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.read_link_impl(path)
    }

    fn create_file_new(&self, path: &Path) -> Result<Box<dyn io::Write + Send>> {
        self.create_file_new_impl(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn io::Read + Send>> {
        self.open_impl(path)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.modified_impl(path)
    }
}

/// Find the I/O error kind at the root of an error chain, if any.
pub fn io_error_kind(err: &anyhow::Error) -> Option<io::ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .map(io::Error::kind)
}

pub fn is_already_exists(err: &anyhow::Error) -> bool {
    io_error_kind(err) == Some(io::ErrorKind::AlreadyExists)
}

pub fn is_not_found(err: &anyhow::Error) -> bool {
    io_error_kind(err) == Some(io::ErrorKind::NotFound)
}
