//! CPU reference implementation of MSAA resolve filtering combined with
//! temporal anti-aliasing, plus the small rasterizer that feeds it.

pub mod buffer;
pub mod colour;
pub mod config;
pub mod error;
pub mod filter;
pub mod jitter;
pub mod mesh;
pub mod post_processor;
pub mod rasterizer;
pub mod renderer;
pub mod resolve;
pub mod shader;
pub mod temporal;

pub use buffer::{ColourBuffer, SampleBuffer};
pub use config::ResolveConfiguration;
pub use error::{ConfigError, ResolveError, ResolveResult};
pub use temporal::TemporalResolver;
