//! Bit-depth preserving raster loading, integer sample histograms and
//! histogram plots.

pub mod compare;
pub mod config;
pub mod error;
pub mod histogram;
pub mod loader;
pub mod plot;
pub mod pnm;
pub mod raster;
pub mod report;

pub use error::{HistError, PnmError, Result};
pub use histogram::{BinRange, Histogram};
pub use loader::load_raster;
pub use raster::Raster;
