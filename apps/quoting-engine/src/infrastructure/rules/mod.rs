//! Rule file loading.

mod loader;

pub use loader::load_rules_from_file;
