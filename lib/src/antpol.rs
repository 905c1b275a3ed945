use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Highest antenna number the array schema allows.
pub const MAX_ANT_NUMBER: u32 = 350;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    E,
    N,
}

impl Polarization {
    pub fn as_char(&self) -> char {
        match self {
            Polarization::E => 'e',
            Polarization::N => 'n',
        }
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One polarization of one antenna, written as e.g. `12e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AntPol {
    pub ant: u32,
    pub pol: Polarization,
}

fn antpol_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<ant>\d+)(?P<pol>[eEnN])$").expect("valid antpol regex"))
}

fn auto_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^auto:(?P<ant>\d+)(?P<pol>[eEnN])$").expect("valid auto key regex")
    })
}

fn snap_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"heraNode(?P<node>\d+)Snap(?P<snap>\d+)").expect("valid snap regex")
    })
}

impl AntPol {
    pub fn new(ant: u32, pol: Polarization) -> Result<Self> {
        if ant > MAX_ANT_NUMBER {
            return Err(Error::InvalidAntPol(format!("{}{}", ant, pol)));
        }
        Ok(AntPol { ant, pol })
    }

    /// Redis key holding the raw autocorrelation, e.g. `auto:12e`.
    pub fn auto_key(&self) -> String {
        format!("auto:{}", self)
    }

    /// Redis hash holding the digital eq coefficients, e.g. `eq:ant:12:e`.
    pub fn eq_key(&self) -> String {
        format!("eq:ant:{}:{}", self.ant, self.pol)
    }

    pub fn from_auto_key(key: &str) -> Result<Self> {
        let caps = auto_key_regex()
            .captures(key.trim())
            .ok_or_else(|| Error::InvalidAntPol(key.to_string()))?;
        Self::from_parts(key, &caps["ant"], &caps["pol"])
    }

    fn from_parts(raw: &str, ant: &str, pol: &str) -> Result<Self> {
        let invalid = || Error::InvalidAntPol(raw.to_string());
        let ant = ant.parse::<u32>().map_err(|_| invalid())?;
        let pol = match pol {
            "e" | "E" => Polarization::E,
            "n" | "N" => Polarization::N,
            _ => return Err(invalid()),
        };
        Self::new(ant, pol).map_err(|_| invalid())
    }
}

impl FromStr for AntPol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = antpol_regex()
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidAntPol(s.to_string()))?;
        Self::from_parts(s, &caps["ant"], &caps["pol"])
    }
}

impl fmt::Display for AntPol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.ant, self.pol)
    }
}

impl Serialize for AntPol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AntPol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A SNAP board identified by its hostname, e.g. `heraNode3Snap1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapHost {
    pub node: u32,
    pub snap: u32,
}

impl SnapHost {
    pub fn parse(hostname: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("invalid snap hostname '{}'", hostname));
        let caps = snap_regex().captures(hostname).ok_or_else(invalid)?;
        Ok(SnapHost {
            node: caps["node"].parse().map_err(|_| invalid())?,
            snap: caps["snap"].parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for SnapHost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "heraNode{}Snap{}", self.node, self.snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let ap: AntPol = "12e".parse().unwrap();
        assert_eq!(ap, AntPol { ant: 12, pol: Polarization::E });
        assert_eq!(ap.to_string(), "12e");
        assert_eq!("7N".parse::<AntPol>().unwrap().to_string(), "7n");
    }

    #[test]
    fn rejects_garbage() {
        assert!("12".parse::<AntPol>().is_err());
        assert!("e12".parse::<AntPol>().is_err());
        assert!("12x".parse::<AntPol>().is_err());
        assert!("351e".parse::<AntPol>().is_err());
        assert!("".parse::<AntPol>().is_err());
    }

    #[test]
    fn redis_keys() {
        let ap = AntPol::new(136, Polarization::N).unwrap();
        assert_eq!(ap.auto_key(), "auto:136n");
        assert_eq!(ap.eq_key(), "eq:ant:136:n");
        assert_eq!(AntPol::from_auto_key("auto:136n").unwrap(), ap);
        assert!(AntPol::from_auto_key("auto:timestamp").is_err());
        assert!(AntPol::from_auto_key("136n").is_err());
    }

    #[test]
    fn ordering_by_antenna_then_pol() {
        let mut aps: Vec<AntPol> = ["12n", "3e", "12e", "3n"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        aps.sort();
        let names: Vec<String> = aps.iter().map(|a| a.to_string()).collect();
        assert_eq!(names, ["3e", "3n", "12e", "12n"]);
    }

    #[test]
    fn serde_as_string() {
        let ap: AntPol = "0e".parse().unwrap();
        let json = serde_json::to_string(&ap).unwrap();
        assert_eq!(json, "\"0e\"");
        assert_eq!(serde_json::from_str::<AntPol>(&json).unwrap(), ap);
    }

    #[test]
    fn snap_hostname() {
        let host = SnapHost::parse("heraNode3Snap1").unwrap();
        assert_eq!(host, SnapHost { node: 3, snap: 1 });
        assert_eq!(host.to_string(), "heraNode3Snap1");
        assert!(SnapHost::parse("heraNode3").is_err());
    }
}
