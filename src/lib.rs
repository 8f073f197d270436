//! Pixelator: load an image, apply a block-pixelation (mosaic) effect and
//! export the result.
//!
//! The transform itself lives in [`ops::effects`]; [`session::Session`] owns
//! the loaded image, the live parameters and the rendered surface that the
//! GUI and the CLI both drive.

pub mod logger;

pub mod cli;
pub mod io;
pub mod ops;
pub mod raster;
pub mod session;
pub mod settings;

pub use ops::effects::{pixelate, pixelate_core, pixelate_image, pixelate_raster};
pub use raster::{BlockSize, RasterBuffer, RasterError};
pub use session::{Session, SourceImage};
