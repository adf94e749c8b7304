//! Transmission chain construction

mod builder;
mod result;
mod window;


pub use builder::{build, build_at, count, count_at, process, BuildMode, BuildStats, ChainBuilder};
pub use result::{ChainCount, ChainDetail, ChainNetwork, ChainSet, ChainSize, ChainsResult};
pub use window::ActivityWindow;
