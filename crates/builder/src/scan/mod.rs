//! Per-image reuse decisions and the concurrent stream that drives them.
//!
//! [`discover`] lists candidate images, [`scan_file`] settles one image
//! against the previous map and [`scan`] runs both as a bounded concurrent
//! stream of [`ScanEvent`]s.

mod discover;
pub(crate) mod error;
mod file;
mod stream;

pub use self::discover::discover;
pub use self::file::{Scan, ScanEffort, scan_file};
pub use self::stream::{ScanEvent, scan};
