//! Decoder and analyzer for libtorrent `.fastresume` records.
//!
//! Raw bytes go through [`bencode::decode`], get projected into a
//! [`resume::ResumeRecord`], and are summarized by
//! [`analysis::Metrics`]. [`render`] turns any value tree into text.

pub mod analysis;
pub mod bencode;
pub mod cli;
pub mod error;
pub mod render;
pub mod resume;

pub use error::{ResumeError, Result};
pub use resume::{load_resume_file, parse_resume, Resume, ResumeRecord};
