//! Reconstruction filter kernels shared by the MSAA resolve and the history
//! reprojection.

use std::f32::consts::PI;
use crate::config::{FilterType, ResolveConfiguration};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KernelParams {
    /// Distance at which the kernel reaches the edge of its support.
    pub radius: f32,
    pub gaussian_sigma: f32,
    pub cubic_b: f32,
    pub cubic_c: f32,
    /// Maps the normalized distance onto the [0, 2] support of the cubics.
    pub cubic_scale: f32,
}

/// (B, C) pair for the cubic variants, `None` for everything else.
pub fn cubic_coefficients(filter_type: FilterType, custom_b: f32, custom_c: f32) -> Option<(f32, f32)> {
    match filter_type {
        FilterType::BSpline => Some((1.0, 0.0)),
        FilterType::CatmullRom => Some((0.0, 0.5)),
        FilterType::Mitchell => Some((1.0 / 3.0, 1.0 / 3.0)),
        FilterType::GeneralizedCubic => Some((custom_b, custom_c)),
        _ => None,
    }
}

/// A filter with its evaluation function picked once, up front.
#[derive(Copy, Clone)]
pub struct FilterKernel {
    filter_type: FilterType,
    params: KernelParams,
    evaluate: fn(&KernelParams, f32) -> f32,
}

impl FilterKernel {
    pub fn new(filter_type: FilterType, mut params: KernelParams) -> Self {
        if let Some((b, c)) = cubic_coefficients(filter_type, params.cubic_b, params.cubic_c) {
            params.cubic_b = b;
            params.cubic_c = c;
        }

        let evaluate: fn(&KernelParams, f32) -> f32 = match filter_type {
            FilterType::Box => filter_box,
            FilterType::Triangle => filter_triangle,
            FilterType::Gaussian => filter_gaussian,
            FilterType::BlackmanHarris => filter_blackman_harris,
            FilterType::Smoothstep => filter_smoothstep,
            FilterType::BSpline | FilterType::CatmullRom | FilterType::Mitchell | FilterType::GeneralizedCubic => filter_cubic,
            FilterType::Sinc => filter_sinc,
        };

        Self { filter_type, params, evaluate }
    }

    /// Kernel for the spatial MSAA resolve, spanning the configured diameter.
    pub fn resolve(config: &ResolveConfiguration) -> Self {
        Self::new(config.resolve_filter_type, KernelParams {
            radius: config.resolve_filter_diameter / 2.0,
            gaussian_sigma: config.gaussian_sigma,
            cubic_b: config.cubic_b,
            cubic_c: config.cubic_c,
            cubic_scale: 2.0,
        })
    }

    /// Kernel for resampling history, one pixel in radius.
    pub fn reprojection(config: &ResolveConfiguration) -> Self {
        Self::new(config.reprojection_filter, KernelParams {
            radius: 1.0,
            gaussian_sigma: config.gaussian_sigma,
            cubic_b: config.cubic_b,
            cubic_c: config.cubic_c,
            cubic_scale: 1.0,
        })
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn radius(&self) -> f32 {
        self.params.radius
    }

    #[inline(always)]
    pub fn weight(&self, distance: f32) -> f32 {
        (self.evaluate)(&self.params, distance.abs() / self.params.radius)
    }

    #[inline(always)]
    pub fn weight_2d(&self, dx: f32, dy: f32) -> f32 {
        self.weight(dx) * self.weight(dy)
    }
}

fn filter_box(_: &KernelParams, x: f32) -> f32 {
    if x <= 1.0 { 1.0 } else { 0.0 }
}

fn filter_triangle(_: &KernelParams, x: f32) -> f32 {
    (1.0 - x).max(0.0)
}

fn filter_gaussian(params: &KernelParams, x: f32) -> f32 {
    let sigma = params.gaussian_sigma;
    let g = 1.0 / (2.0 * PI * sigma * sigma).sqrt();
    g * (-(x * x) / (2.0 * sigma * sigma)).exp()
}

fn filter_blackman_harris(_: &KernelParams, x: f32) -> f32 {
    if x > 1.0 {
        return 0.0;
    }

    const A0: f32 = 0.35875;
    const A1: f32 = 0.48829;
    const A2: f32 = 0.14128;
    const A3: f32 = 0.01168;

    let x = 1.0 - x;
    let w = A0 - A1 * (PI * x).cos() + A2 * (2.0 * PI * x).cos() - A3 * (3.0 * PI * x).cos();
    w.clamp(0.0, 1.0)
}

fn filter_smoothstep(_: &KernelParams, x: f32) -> f32 {
    let t = x.clamp(0.0, 1.0);
    1.0 - t * t * (3.0 - 2.0 * t)
}

fn filter_cubic(params: &KernelParams, x: f32) -> f32 {
    let b = params.cubic_b;
    let c = params.cubic_c;
    let x = x * params.cubic_scale;
    let x2 = x * x;
    let x3 = x2 * x;

    let y = if x < 1.0 {
        (12.0 - 9.0 * b - 6.0 * c) * x3 + (-18.0 + 12.0 * b + 6.0 * c) * x2 + (6.0 - 2.0 * b)
    } else if x <= 2.0 {
        (-b - 6.0 * c) * x3 + (6.0 * b + 30.0 * c) * x2 + (-12.0 * b - 48.0 * c) * x + (8.0 * b + 24.0 * c)
    } else {
        0.0
    };

    y / 6.0
}

fn filter_sinc(params: &KernelParams, x: f32) -> f32 {
    if x > 1.0 {
        return 0.0;
    }

    let x = x * params.radius * 2.0;
    if x < 0.001 {
        1.0
    } else {
        (x * PI).sin() / (x * PI)
    }
}
