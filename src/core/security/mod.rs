// Security module for path validation and access control
//
// Filesystem tools resolve every user-supplied path through this module so
// that operations stay inside the configured root directory.

pub mod path_validator;

pub use path_validator::{PathGuard, PathSecurityError, validate_path};
