use crate::error::ConfigError;

/// Smallest diameter the custom resolve accepts. Every subsample of the
/// standard patterns lies strictly inside half a pixel, so this keeps the
/// pixel's own samples inside the filter support.
pub const MIN_RESOLVE_FILTER_DIAMETER: f32 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MsaaMode {
    None,
    Msaa2x,
    Msaa4x,
    Msaa8x,
}

impl MsaaMode {
    pub const ALL: [MsaaMode; 4] = [MsaaMode::None, MsaaMode::Msaa2x, MsaaMode::Msaa4x, MsaaMode::Msaa8x];

    pub fn sample_count(self) -> usize {
        match self {
            MsaaMode::None => 1,
            MsaaMode::Msaa2x => 2,
            MsaaMode::Msaa4x => 4,
            MsaaMode::Msaa8x => 8,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterType {
    Box,
    Triangle,
    Gaussian,
    BlackmanHarris,
    Smoothstep,
    BSpline,
    CatmullRom,
    Mitchell,
    GeneralizedCubic,
    Sinc,
}

impl FilterType {
    pub const ALL: [FilterType; 10] = [
        FilterType::Box,
        FilterType::Triangle,
        FilterType::Gaussian,
        FilterType::BlackmanHarris,
        FilterType::Smoothstep,
        FilterType::BSpline,
        FilterType::CatmullRom,
        FilterType::Mitchell,
        FilterType::GeneralizedCubic,
        FilterType::Sinc,
    ];
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClampMode {
    Disabled,
    RgbClamp,
    RgbClip,
    VarianceClip,
}

impl ClampMode {
    pub const ALL: [ClampMode; 4] = [ClampMode::Disabled, ClampMode::RgbClamp, ClampMode::RgbClip, ClampMode::VarianceClip];
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JitterMode {
    None,
    Uniform2x,
    Hammersley4x,
    Hammersley8x,
    Hammersley16x,
}

impl JitterMode {
    pub const ALL: [JitterMode; 5] = [
        JitterMode::None,
        JitterMode::Uniform2x,
        JitterMode::Hammersley4x,
        JitterMode::Hammersley8x,
        JitterMode::Hammersley16x,
    ];

    /// Number of frames before the sequence repeats.
    pub fn period(self) -> u64 {
        match self {
            JitterMode::None => 1,
            JitterMode::Uniform2x => 2,
            JitterMode::Hammersley4x => 4,
            JitterMode::Hammersley8x => 8,
            JitterMode::Hammersley16x => 16,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DilationMode {
    CenterAverage,
    DilateNearestDepth,
    DilateGreatestVelocity,
}

impl DilationMode {
    pub const ALL: [DilationMode; 3] = [
        DilationMode::CenterAverage,
        DilationMode::DilateNearestDepth,
        DilationMode::DilateGreatestVelocity,
    ];
}

/// Returns the entry after `current` in `all`, wrapping around.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let index = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(index + 1) % all.len()]
}

/// Snapshot of every tunable read by one frame's resolve.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolveConfiguration {
    pub msaa_mode: MsaaMode,
    pub resolve_filter_type: FilterType,
    pub resolve_filter_diameter: f32,
    pub gaussian_sigma: f32,
    pub cubic_b: f32,
    pub cubic_c: f32,
    pub use_standard_resolve: bool,
    pub inverse_luminance_filtering: bool,
    pub use_exposure_filtering: bool,
    /// Exposure offset in stops added to `manual_exposure` for filter weights.
    pub exposure_filter_offset: f32,
    /// Exposure in stops the downstream tone mapper applies.
    pub manual_exposure: f32,
    pub enable_temporal_aa: bool,
    pub temporal_aa_blend_factor: f32,
    pub use_temporal_colour_weighting: bool,
    pub neighborhood_clamp_mode: ClampMode,
    pub variance_clip_gamma: f32,
    pub jitter_mode: JitterMode,
    pub jitter_scale: f32,
    pub low_freq_weight: f32,
    pub hi_freq_weight: f32,
    pub sharpening_amount: f32,
    pub dilation_mode: DilationMode,
    pub mip_bias: f32,
    pub reprojection_filter: FilterType,
    pub use_standard_reprojection: bool,
}

impl Default for ResolveConfiguration {
    fn default() -> Self {
        Self {
            msaa_mode: MsaaMode::Msaa4x,
            resolve_filter_type: FilterType::BSpline,
            resolve_filter_diameter: 2.0,
            gaussian_sigma: 0.5,
            cubic_b: 0.33,
            cubic_c: 0.33,
            use_standard_resolve: false,
            inverse_luminance_filtering: true,
            use_exposure_filtering: true,
            exposure_filter_offset: 2.0,
            manual_exposure: -2.5,
            enable_temporal_aa: true,
            temporal_aa_blend_factor: 0.9,
            use_temporal_colour_weighting: false,
            neighborhood_clamp_mode: ClampMode::VarianceClip,
            variance_clip_gamma: 1.5,
            jitter_mode: JitterMode::Hammersley4x,
            jitter_scale: 1.0,
            low_freq_weight: 0.25,
            hi_freq_weight: 0.85,
            sharpening_amount: 0.0,
            dilation_mode: DilationMode::DilateNearestDepth,
            mip_bias: 0.0,
            reprojection_filter: FilterType::CatmullRom,
            use_standard_reprojection: false,
        }
    }
}

impl ResolveConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let diameter = self.resolve_filter_diameter;
        if !self.use_standard_resolve && !(diameter.is_finite() && diameter >= MIN_RESOLVE_FILTER_DIAMETER) {
            return Err(ConfigError::FilterDiameter { value: diameter, min: MIN_RESOLVE_FILTER_DIAMETER });
        }

        if !(self.gaussian_sigma.is_finite() && self.gaussian_sigma > 0.0) {
            return Err(ConfigError::GaussianSigma(self.gaussian_sigma));
        }

        for (name, value) in [("B", self.cubic_b), ("C", self.cubic_c)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::CubicCoefficient { name, value });
            }
        }

        if !(0.0..=1.0).contains(&self.temporal_aa_blend_factor) {
            return Err(ConfigError::BlendFactor(self.temporal_aa_blend_factor));
        }

        if self.neighborhood_clamp_mode == ClampMode::VarianceClip
            && !(self.variance_clip_gamma.is_finite() && self.variance_clip_gamma > 0.0)
        {
            return Err(ConfigError::VarianceClipGamma(self.variance_clip_gamma));
        }

        if !(self.jitter_scale.is_finite() && self.jitter_scale >= 0.0) {
            return Err(ConfigError::JitterScale(self.jitter_scale));
        }

        if !(0.0..=1.0).contains(&self.sharpening_amount) {
            return Err(ConfigError::SharpeningAmount(self.sharpening_amount));
        }

        for (name, value) in [("low", self.low_freq_weight), ("high", self.hi_freq_weight)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::FrequencyWeight { name, value });
            }
        }

        if !(self.mip_bias.is_finite() && self.mip_bias <= 0.0) {
            return Err(ConfigError::MipBias(self.mip_bias));
        }

        for (name, value) in [
            ("exposure filter offset", self.exposure_filter_offset),
            ("manual exposure", self.manual_exposure),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }

        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        self.msaa_mode.sample_count()
    }

    /// Jitter is only applied when the temporal pass is there to integrate it.
    pub fn jitter_enabled(&self) -> bool {
        self.enable_temporal_aa && self.jitter_mode != JitterMode::None && !self.use_standard_resolve
    }

    /// Sharpening for the displayed image; the standard resolve is shown as is.
    pub fn display_sharpening(&self) -> f32 {
        if self.use_standard_resolve { 0.0 } else { self.sharpening_amount }
    }

    /// Linear scale applied to luminance before inverse-luminance weighting.
    pub fn filter_exposure(&self) -> f32 {
        if self.use_exposure_filtering {
            (self.manual_exposure + self.exposure_filter_offset).exp2()
        } else {
            1.0
        }
    }

    /// Half-width of the resolve filter footprint in whole pixels.
    pub fn sample_radius(&self) -> i32 {
        ((self.resolve_filter_diameter / 2.0) + 0.499) as i32
    }
}
