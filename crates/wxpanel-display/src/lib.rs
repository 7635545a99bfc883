//! Presentation side of the panel.
//!
//! [`PresentationSync`] is the only code that talks to a [`DisplaySurface`];
//! it never does network I/O.

pub mod console;
pub mod surface;
pub mod sync;

pub use console::{ConsoleSurface, DirAssetStore};
pub use surface::{AssetStore, DisplaySurface, Field, ImageHandle};
pub use sync::{Frame, PresentationSync};
