pub mod synthetic_raster;
