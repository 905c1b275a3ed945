mod antpol;
mod cache;
mod codec;
mod error;
mod float;
pub mod lttb;
pub mod spectrum;
mod target;

pub use antpol::*;
pub use cache::*;
pub use codec::*;
pub use error::*;
pub use lttb::{downsample, downsample_columns, Point};
pub use spectrum::{AutoSpectrum, RawAuto, Snapshot};
pub use target::*;
