//! Per-format tag handling.
//!
//! A small registry maps file extensions to a handler kind. Formats with a
//! compiled-in tag family read and write metadata through lofty; the rest
//! fall back to a playback-only handler that cannot persist tags.

mod handler;
mod registry;

pub use handler::{FileTags, read_file_tags, write_file_tags};
pub use registry::{HandlerKind, resolve};
