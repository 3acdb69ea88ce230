use std::path::PathBuf;

/// Errors raised while parsing a Netpbm (PGM/PPM) stream.
#[derive(Debug, thiserror::Error)]
pub enum PnmError {
    #[error("unknown magic number {0:?}, expected P2, P3, P5 or P6")]
    BadMagic([u8; 2]),
    #[error("malformed header: {0}")]
    BadHeader(String),
    #[error("maxval {0} outside 1..=65535")]
    BadMaxval(u32),
    #[error("not enough data: expected {expected} samples, found {found}")]
    TruncatedData { expected: usize, found: usize },
    #[error("sample {value} at index {index} exceeds maxval {max_val}")]
    SampleOutOfRange { index: usize, value: u32, max_val: u16 },
}

/// Errors that can occur while loading, binning, comparing or plotting rasters.
#[derive(Debug, thiserror::Error)]
pub enum HistError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("pnm error: {0}")]
    Pnm(#[from] PnmError),
    #[error("invalid raster: {0}")]
    InvalidRaster(String),
    #[error("invalid bin range [{lower}, {upper})")]
    InvalidRange { lower: i32, upper: i32 },
    #[error("mismatching images: {0}")]
    Mismatch(String),
    #[error("plot error: {0}")]
    Plot(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HistError>;
