use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Output size used by the autospectra ingestion task.
pub const DEFAULT_TARGET: usize = 350;

/// Smallest output the downsampler accepts.
pub const MIN_TARGET: usize = 3;

/// How many points a downsampled series should have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSize {
    /// Always this many points.
    Fixed(usize),
    /// `round(n / divisor)` points, halves to even, but never fewer than
    /// [`MIN_TARGET`].
    Proportional { divisor: usize },
}

impl TargetSize {
    // Resolve returns the target size for a series of n points.
    pub fn resolve(&self, n: usize) -> usize {
        match *self {
            TargetSize::Fixed(m) => m,
            TargetSize::Proportional { divisor } => {
                let ratio = n as f64 / divisor as f64;
                if ratio > MIN_TARGET as f64 {
                    ratio.round_ties_even() as usize
                } else {
                    MIN_TARGET
                }
            }
        }
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        TargetSize::Fixed(DEFAULT_TARGET)
    }
}

impl FromStr for TargetSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::InvalidTarget(s.to_string());

        match s.split_once('/') {
            None => s.parse().map(TargetSize::Fixed).map_err(|_| invalid()),
            Some((num, den)) => {
                if num.trim() != "1" {
                    return Err(invalid());
                }
                match den.trim().parse::<usize>() {
                    Ok(divisor) if divisor > 0 => Ok(TargetSize::Proportional { divisor }),
                    _ => Err(invalid()),
                }
            }
        }
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TargetSize::Fixed(m) => write!(f, "{}", m),
            TargetSize::Proportional { divisor } => write!(f, "1/{}", divisor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_length() {
        assert_eq!(TargetSize::Fixed(350).resolve(8192), 350);
        assert_eq!(TargetSize::Fixed(350).resolve(10), 350);
        assert_eq!(TargetSize::default(), TargetSize::Fixed(DEFAULT_TARGET));
    }

    #[test]
    fn proportional_rounds_with_floor() {
        let t = TargetSize::Proportional { divisor: 5 };
        assert_eq!(t.resolve(8192), 1638);
        assert_eq!(t.resolve(8193), 1639);
        assert_eq!(t.resolve(16), 3);
        assert_eq!(t.resolve(15), 3);
        assert_eq!(t.resolve(0), 3);
    }

    #[test]
    fn proportional_rounds_halves_to_even() {
        let t = TargetSize::Proportional { divisor: 2 };
        assert_eq!(t.resolve(9), 4);
        assert_eq!(t.resolve(11), 6);
        assert_eq!(t.resolve(13), 6);
    }

    #[test]
    fn parse() {
        assert_eq!("350".parse::<TargetSize>().unwrap(), TargetSize::Fixed(350));
        assert_eq!(
            " 1/5 ".parse::<TargetSize>().unwrap(),
            TargetSize::Proportional { divisor: 5 }
        );
        assert!("1/0".parse::<TargetSize>().is_err());
        assert!("2/5".parse::<TargetSize>().is_err());
        assert!("abc".parse::<TargetSize>().is_err());
        assert!("-3".parse::<TargetSize>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for t in [TargetSize::Fixed(42), TargetSize::Proportional { divisor: 7 }] {
            assert_eq!(t.to_string().parse::<TargetSize>().unwrap(), t);
        }
    }
}
