//! Filesystem tools.
//!
//! All paths go through `core::security::PathGuard`, so operations stay
//! inside the configured root directory. These tools are only registered
//! when a root is configured.

pub mod delete;
pub mod list_dir;

pub use delete::FsDeleteTool;
pub use list_dir::FsListDirTool;
