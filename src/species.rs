//! Fixed class label table for the Iris classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Iris species predicted by the classifier, keyed by class index `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    #[serde(rename = "Iris-setosa")]
    Setosa,
    #[serde(rename = "Iris-versicolor")]
    Versicolor,
    #[serde(rename = "Iris-virginica")]
    Virginica,
}

impl Species {
    /// Every species in class-index order.
    pub const ALL: [Species; 3] = [Species::Setosa, Species::Versicolor, Species::Virginica];
    /// Number of known classes.
    pub const COUNT: usize = Self::ALL.len();

    /// Class index used in datasets and model columns.
    pub fn index(self) -> usize {
        match self {
            Species::Setosa => 0,
            Species::Versicolor => 1,
            Species::Virginica => 2,
        }
    }

    /// Look up a species by class index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable label returned by the prediction endpoint.
    pub fn label(self) -> &'static str {
        match self {
            Species::Setosa => "Iris-setosa",
            Species::Versicolor => "Iris-versicolor",
            Species::Virginica => "Iris-virginica",
        }
    }

    /// Parse a dataset label that is either a class index or a species name.
    ///
    /// Accepts `1`, `1.0`, `Iris-versicolor` and `versicolor` (case-insensitive).
    pub fn parse_label(raw: &str) -> Option<Self> {
        let value = raw.trim().trim_matches('"');
        if let Ok(index) = value.parse::<usize>() {
            return Self::from_index(index);
        }
        if let Ok(index) = value.parse::<f64>() {
            if index.fract() == 0.0 && index >= 0.0 {
                return Self::from_index(index as usize);
            }
            return None;
        }
        let lowered = value.to_ascii_lowercase();
        let name = lowered.strip_prefix("iris-").unwrap_or(&lowered);
        match name {
            "setosa" => Some(Species::Setosa),
            "versicolor" => Some(Species::Versicolor),
            "virginica" => Some(Species::Virginica),
            _ => None,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
