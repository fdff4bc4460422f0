//! Pure domain logic for the vidfetch download service.
//!
//! No internal dependencies and no I/O: the downloader argument builder,
//! the output stream parser, the media format enum, validation helpers,
//! and the shared error type live here.

pub mod error;
pub mod logging;
pub mod media;
pub mod parser;
pub mod ytdlp;
