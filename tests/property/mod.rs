//! Property-based tests for archive naming and layout

mod archive_layout;
mod structure_parsing;
