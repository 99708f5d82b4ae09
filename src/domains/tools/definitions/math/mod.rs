//! Arithmetic tools.

pub mod add;

pub use add::AddTool;
