//! JSON (de)serialization of `f64` that keeps NaN and infinities.
//!
//! serde_json writes non-finite floats as `null`, which cannot be read back.
//! Here finite values stay plain numbers and the others are written as the
//! strings `"NaN"`, `"Infinity"` and `"-Infinity"`.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::lttb::Point;

#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonFloat(pub f64);

impl Serialize for JsonFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            serializer.serialize_str("NaN")
        } else if v > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }
}

struct JsonFloatVisitor;

impl<'de> Visitor<'de> for JsonFloatVisitor {
    type Value = JsonFloat;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<JsonFloat, E> {
        Ok(JsonFloat(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<JsonFloat, E> {
        Ok(JsonFloat(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<JsonFloat, E> {
        Ok(JsonFloat(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<JsonFloat, E> {
        match v {
            "NaN" | "nan" => Ok(JsonFloat(f64::NAN)),
            "Infinity" | "inf" => Ok(JsonFloat(f64::INFINITY)),
            "-Infinity" | "-inf" => Ok(JsonFloat(f64::NEG_INFINITY)),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for JsonFloat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(JsonFloatVisitor)
    }
}

/// `#[serde(with = "crate::float::vec")]` for `Vec<f64>` fields.
pub(crate) mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for &v in values {
            seq.serialize_element(&JsonFloat(v))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        struct SeqVisitor;

        impl<'de> Visitor<'de> for SeqVisitor {
            type Value = Vec<f64>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<f64>, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(JsonFloat(v)) = seq.next_element()? {
                    out.push(v);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}

/// A point series as a list of `[x, y]` pairs.
pub(crate) fn points_to_json(points: &[Point]) -> serde_json::Result<Vec<u8>> {
    let pairs: Vec<(JsonFloat, JsonFloat)> = points
        .iter()
        .map(|&(x, y)| (JsonFloat(x), JsonFloat(y)))
        .collect();
    serde_json::to_vec(&pairs)
}

pub(crate) fn points_from_json(buf: &[u8]) -> serde_json::Result<Vec<Point>> {
    let pairs: Vec<(JsonFloat, JsonFloat)> = serde_json::from_slice(buf)?;
    Ok(pairs.into_iter().map(|(x, y)| (x.0, y.0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_points_survive_json() {
        let points = vec![(0.0, f64::NAN), (1.0, f64::INFINITY), (2.0, f64::NEG_INFINITY), (3.0, 1.5)];
        let json = points_to_json(&points).unwrap();
        assert_eq!(
            String::from_utf8(json.clone()).unwrap(),
            r#"[[0.0,"NaN"],[1.0,"Infinity"],[2.0,"-Infinity"],[3.0,1.5]]"#
        );

        let back = points_from_json(&json).unwrap();
        assert_eq!(back.len(), 4);
        assert!(back[0].1.is_nan());
        assert_eq!(back[1].1, f64::INFINITY);
        assert_eq!(back[2].1, f64::NEG_INFINITY);
        assert_eq!(back[3], (3.0, 1.5));
    }

    #[test]
    fn integers_and_unknown_strings() {
        assert_eq!(points_from_json(b"[[1,-2]]").unwrap(), vec![(1.0, -2.0)]);
        assert!(points_from_json(b"[[1,\"big\"]]").is_err());
        assert!(points_from_json(b"[[1,null]]").is_err());
    }
}
