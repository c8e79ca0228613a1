use nalgebra::Vector3;

/// Linear HDR RGB.
pub type Colour = Vector3<f32>;

pub fn luminance(colour: &Colour) -> f32 {
    0.2126 * colour.x + 0.7152 * colour.y + 0.0722 * colour.z
}

/// `max(x, 0)` that lets NaN through instead of swallowing it.
#[inline(always)]
pub fn floor_zero(x: f32) -> f32 {
    if x < 0.0 { 0.0 } else { x }
}

#[inline(always)]
pub fn floor_zero_colour(colour: Colour) -> Colour {
    colour.map(floor_zero)
}

#[inline(always)]
pub fn saturate(x: f32) -> f32 {
    if x < 0.0 { 0.0 } else if x > 1.0 { 1.0 } else { x }
}

/// Packs a display-referred colour into `0x00RRGGBB`.
pub fn convert_colour_to_u32(colour: Colour) -> u32 {
    let r = (saturate(colour.x) * 255.0 + 0.5) as u8 as u32;
    let g = (saturate(colour.y) * 255.0 + 0.5) as u8 as u32;
    let b = (saturate(colour.z) * 255.0 + 0.5) as u8 as u32;
    (r << 16) | (g << 8) | b
}
