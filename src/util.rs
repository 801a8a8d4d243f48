pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Rounds half away from zero and clamps into `u32`
pub fn round_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value.round() as u32
    }
}

/// Running mean after adding `count` samples whose mean is `sample_mean`
/// to `prev_count` samples whose mean is `prev_mean`
pub fn weighted_mean(prev_mean: f64, prev_count: u64, sample_mean: f64, count: u64) -> f64 {
    let total = prev_count + count;
    if total == 0 {
        return 0.0;
    }
    (prev_mean * prev_count as f64 + sample_mean * count as f64) / total as f64
}
