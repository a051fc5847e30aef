pub mod config;
pub mod decode;
pub mod error;
pub mod scaler;
pub mod processing {
    pub mod fit;
    pub mod resample;
    pub mod subsample;
}

pub use decode::{FileBackend, ImageBackend, ImageSource};
pub use error::{Error, Result};
pub use processing::fit::{Dimensions, FitResult, compute_fit};
pub use scaler::{ScaledImage, scale_to_fit};
