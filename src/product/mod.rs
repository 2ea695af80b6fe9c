//! SNODAS products and the file-name grammar that identifies them.

pub mod code;
pub mod file_name;

pub use code::{Product, VariableSet};
pub use file_name::MemberName;
