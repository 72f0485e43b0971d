// This module provides items used by code generated in tagconf-macros
// The actual define_loadable! macro is in the tagconf-macros crate

pub use std::sync::OnceLock;
