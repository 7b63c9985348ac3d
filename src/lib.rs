//! Loci: Memory Palace Generator
//!
//! Turns a theme and a block of technical content into a memory palace: an
//! ordered sequence of rooms, each pairing a vivid scene with the verbatim
//! facts it encodes and an optional illustration. A structure provider plans
//! the rooms, an image provider paints them concurrently, and the result is
//! exported as a zip holding a Markdown blueprint and the images.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod palace;
pub mod provider;
