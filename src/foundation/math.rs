pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Arithmetic mean; `NaN` for an empty slice.
pub(crate) fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation around `mean` (divides by `n`).
pub(crate) fn std_dev(data: &[f64], mean: f64) -> f64 {
    let variance = data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}
