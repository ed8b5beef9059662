//! `vbox-video` - Embed a video reference into VBOX telemetry files
//!
//! This library locates the camera clip recorded alongside a VBOX `.vbo` log
//! and rewrites the log so analysis tools can play the clip in sync with the
//! logged data.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod fsio;
pub mod insert;
pub mod logging;
pub mod reference;
pub mod vbo;
pub mod video;

pub use config::{Config, ExistingReference};
pub use error::{Error, Result};
pub use insert::{insert_video_reference, InsertOptions, InsertReport};
pub use logging::init_logging;
pub use reference::VideoReference;
pub use vbo::VboDocument;
pub use video::{is_candidate_video, VideoFile, VideoPattern};
