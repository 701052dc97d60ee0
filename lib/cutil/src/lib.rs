//! # CUtil - Common Utilities Library
//!
//! Small helpers shared by the capture library and the applications.
//!
//! ## Features
//!
//! - `fs`: File system utilities (existence checks, quiet removal, file names)
//! - `time`: Local time formatting used for log lines and screenshot names

#[cfg(feature = "fs")]
pub mod fs;

#[cfg(feature = "time")]
pub mod time;
