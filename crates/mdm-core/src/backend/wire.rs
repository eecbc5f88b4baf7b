//! JSON shapes exchanged with the backend.
//!
//! Status replies are partial: any field may be missing, and a missing field
//! means something different from one sent as `null`. [`Field`] keeps the two
//! apart so reconciliation never resets known values because of an omission.

use serde::{Deserialize, Deserializer, Serialize};

/// A response field that may be absent, explicitly `null`, or carry a value.
///
/// Use with `#[serde(default)]`: a missing key deserializes to `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::Absent | Field::Null => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Field::Value(v),
            None => Field::Null,
        })
    }
}

/// Progress percentage as sent by the backend: a number or a numeric string such as `"45.3%"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPercent {
    Number(f64),
    Text(String),
}

impl RawPercent {
    /// Whole percent clamped into [0, 100]; None if the text is not numeric.
    pub fn to_percent(&self) -> Option<u8> {
        let value = match self {
            RawPercent::Number(n) => *n,
            RawPercent::Text(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        };
        if !value.is_finite() {
            return None;
        }
        Some(value.clamp(0.0, 100.0).floor() as u8)
    }
}

/// The `progress` object of a status reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressWire {
    #[serde(default)]
    pub percentage: Field<RawPercent>,
    #[serde(default)]
    pub speed: Field<String>,
}

/// Reply of `GET /api/status/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Field<String>,
    #[serde(default)]
    pub title: Field<String>,
    #[serde(default)]
    pub progress: Field<ProgressWire>,
    /// Server-side path of the finished artifact.
    #[serde(default)]
    pub filepath: Field<String>,
    /// File name of the finished artifact.
    #[serde(default)]
    pub filename: Field<String>,
    #[serde(default)]
    pub filesize: Field<f64>,
    #[serde(default)]
    pub error: Field<String>,
}

impl StatusResponse {
    /// Progress percent, with absent/null preserved.
    pub fn progress_percent(&self) -> Field<u8> {
        match &self.progress {
            Field::Value(p) => match &p.percentage {
                Field::Value(raw) => raw.to_percent().map(Field::Value).unwrap_or(Field::Absent),
                Field::Null => Field::Null,
                Field::Absent => Field::Absent,
            },
            Field::Null => Field::Null,
            Field::Absent => Field::Absent,
        }
    }

    /// Speed hint, with absent/null preserved.
    pub fn speed_hint(&self) -> Field<String> {
        match &self.progress {
            Field::Value(p) => p.speed.clone(),
            Field::Null => Field::Null,
            Field::Absent => Field::Absent,
        }
    }

    /// File name usable to retrieve the result: `filename`, else the last component of `filepath`.
    pub fn result_filename(&self) -> Option<String> {
        let non_empty = |f: &Field<String>| f.value().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        non_empty(&self.filename).or_else(|| {
            non_empty(&self.filepath).map(|p| {
                p.rsplit(['/', '\\'])
                    .find(|s| !s.is_empty())
                    .unwrap_or(p.as_str())
                    .to_string()
            })
        })
    }

    pub fn file_size_bytes(&self) -> Option<u64> {
        self.filesize
            .value()
            .filter(|n| n.is_finite() && **n >= 0.0)
            .map(|n| *n as u64)
    }

    /// Non-empty error message, if the backend reported one.
    pub fn error_message(&self) -> Option<&str> {
        self.error.value().map(|s| s.as_str()).filter(|s| !s.trim().is_empty())
    }
}

/// Body of `POST /api/download`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBody<'a> {
    pub url: &'a str,
    pub format: &'a str,
    pub quality: &'a str,
}

/// Body of `POST /api/create-gif`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateGifBody<'a> {
    pub url: &'a str,
    pub start_time: u32,
    pub end_time: u32,
    pub quality: &'a str,
    pub fps: u32,
    pub width: u32,
}

/// Reply of the create endpoints: `{download_id}` or `{error}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub download_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchBody<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CollectionBody<'a> {
    pub url: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<crate::collection::Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CollectionResponse {
    #[serde(default)]
    pub videos: Vec<crate::collection::Candidate>,
}
