pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Mean of whole-second samples, 0 when there are none
pub fn mean_seconds(samples: &[u64]) -> f64 {
    let as_f64 = samples.iter().map(|&s| s as f64).collect::<Vec<f64>>();
    mean(&as_f64).unwrap_or(0.0)
}

/// `round(part / whole * 100)` with halves rounded up, in integer arithmetic.
/// Returns 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((part * 200 + whole) / (whole * 2)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_seconds() {
        assert_eq!(mean_seconds(&[4, 0, 8]), 4.0);
        assert_eq!(mean_seconds(&[]), 0.0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 200), 3); // 2.5
    }

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(percentage(0, 7), 0);
        assert_eq!(percentage(7, 7), 100);
        assert_eq!(percentage(9, 7), 100);
        assert_eq!(percentage(0, 0), 0);
    }
}
