/// An out-of-range value in a [`ResolveConfiguration`](crate::config::ResolveConfiguration).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("resolve filter diameter must be finite and at least {min}, got {value}")]
    FilterDiameter { value: f32, min: f32 },

    #[error("gaussian sigma must be finite and greater than zero, got {0}")]
    GaussianSigma(f32),

    #[error("cubic {name} must lie in [0, 1], got {value}")]
    CubicCoefficient { name: &'static str, value: f32 },

    #[error("temporal blend factor must lie in [0, 1], got {0}")]
    BlendFactor(f32),

    #[error("variance clip gamma must be finite and greater than zero, got {0}")]
    VarianceClipGamma(f32),

    #[error("jitter scale must be finite and non-negative, got {0}")]
    JitterScale(f32),

    #[error("sharpening amount must lie in [0, 1], got {0}")]
    SharpeningAmount(f32),

    #[error("{name} frequency weight must be finite and non-negative, got {value}")]
    FrequencyWeight { name: &'static str, value: f32 },

    #[error("mip bias must be finite and not positive, got {0}")]
    MipBias(f32),

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
}

/// Failure of a whole frame's resolve. Nothing is written when one is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("sample buffer is {got_width}x{got_height} but the resolver was sized for {width}x{height}")]
    Dimensions {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("frame {frame_index} arrived after frame {last_committed} was already committed")]
    FrameOrder { frame_index: u64, last_committed: u64 },
}

pub type ResolveResult<T> = Result<T, ResolveError>;
