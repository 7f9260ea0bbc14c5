//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded on its first defined values
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: line from slow - 1, signal and histogram from slow - 1 + signal - 1.

use super::{calculate_ema, Series};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn calculate_macd(closes: &[f64]) -> MacdSeries {
    calculate_macd_with(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

pub fn calculate_macd_with(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let undefined = || vec![None; closes.len()];
    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: undefined(),
            signal: undefined(),
            histogram: undefined(),
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: Series = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let mut signal = undefined();
    if let Some(start) = line.iter().position(Option::is_some) {
        let defined: Vec<f64> = line[start..].iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        for (offset, value) in calculate_ema(&defined, signal_period).into_iter().enumerate() {
            signal[start + offset] = value;
        }
    }

    let histogram: Series = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn macd_warmup_default() {
        let series = calculate_macd(&rising(40));

        let line_warmup = DEFAULT_SLOW - 1;
        let signal_warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;

        assert!(series.line[line_warmup - 1].is_none());
        assert!(series.line[line_warmup].is_some());
        for i in 0..signal_warmup {
            assert!(series.signal[i].is_none(), "signal {} should be undefined", i);
            assert!(series.histogram[i].is_none());
        }
        assert!(series.signal[signal_warmup].is_some());
        assert!(series.histogram[signal_warmup].is_some());
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.4).cos() * 3.0).collect();
        let series = calculate_macd(&closes);

        for i in 0..closes.len() {
            if let (Some(l), Some(s), Some(h)) = (series.line[i], series.signal[i], series.histogram[i]) {
                assert!((h - (l - s)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let closes = rising(10);
        let series = calculate_macd_with(&closes, 3, 5, 2);

        let ema_fast = calculate_ema(&closes, 3);
        let ema_slow = calculate_ema(&closes, 5);

        for i in 4..closes.len() {
            let expected = ema_fast[i].unwrap() - ema_slow[i].unwrap();
            assert!((series.line[i].unwrap() - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn macd_signal_seeded_on_first_defined_line_values() {
        let closes = rising(10);
        let series = calculate_macd_with(&closes, 3, 5, 2);

        // line defined from index 4; signal seed = mean(line[4], line[5])
        let seed = (series.line[4].unwrap() + series.line[5].unwrap()) / 2.0;
        assert!(series.signal[4].is_none());
        assert!((series.signal[5].unwrap() - seed).abs() < f64::EPSILON);
    }

    #[test]
    fn macd_empty() {
        let series = calculate_macd(&[]);
        assert!(series.line.is_empty());
        assert!(series.signal.is_empty());
    }

    #[test]
    fn macd_zero_period() {
        let closes = rising(3);
        assert!(calculate_macd_with(&closes, 0, 26, 9).line.iter().all(Option::is_none));
        assert!(calculate_macd_with(&closes, 12, 0, 9).line.iter().all(Option::is_none));
        assert!(calculate_macd_with(&closes, 12, 26, 0).signal.iter().all(Option::is_none));
    }

    #[test]
    fn macd_default_constants() {
        assert_eq!(DEFAULT_FAST, 12);
        assert_eq!(DEFAULT_SLOW, 26);
        assert_eq!(DEFAULT_SIGNAL, 9);
    }
}
