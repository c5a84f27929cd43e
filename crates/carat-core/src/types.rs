//! Core types for Carat

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a categorical grade with a fixed, ordered domain.
///
/// Each variant maps to the exact label used in the training data; the
/// label is what ends up in the one-hot column name (`cut_Very Good`).
macro_rules! grade {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every category, in domain order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Field name in the request body
            pub const FIELD: &'static str = $field;

            /// Label as it appears in the training data
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// One-hot column name for this category
            pub fn column(&self) -> String {
                format!("{}_{}", Self::FIELD, self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(Error::schema(format!(
                        "unknown {} '{}', expected one of: {}",
                        $field,
                        other,
                        [$($label),+].join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

grade!(
    /// Cut quality, worst to best
    Cut, "cut", {
        Fair => "Fair",
        Good => "Good",
        VeryGood => "Very Good",
        Premium => "Premium",
        Ideal => "Ideal",
    }
);

grade!(
    /// Color grade, best (D) to worst (J)
    Color, "color", {
        D => "D",
        E => "E",
        F => "F",
        G => "G",
        H => "H",
        I => "I",
        J => "J",
    }
);

grade!(
    /// Clarity grade, worst (I1) to best (IF)
    Clarity, "clarity", {
        I1 => "I1",
        Si2 => "SI2",
        Si1 => "SI1",
        Vs2 => "VS2",
        Vs1 => "VS1",
        Vvs2 => "VVS2",
        Vvs1 => "VVS1",
        If => "IF",
    }
);

/// A single diamond to price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiamondRecord {
    /// Weight in carats
    pub carat: f64,

    /// Cut quality
    pub cut: Cut,

    /// Color grade
    pub color: Color,

    /// Clarity grade
    pub clarity: Clarity,

    /// Total depth percentage
    pub depth: f64,

    /// Width of the top relative to the widest point
    pub table: f64,

    /// Length in mm
    pub x: f64,

    /// Width in mm
    pub y: f64,

    /// Depth in mm
    pub z: f64,
}

impl DiamondRecord {
    /// Numeric field names, in training-data order
    pub const NUMERIC_FIELDS: [&'static str; 6] = ["carat", "depth", "table", "x", "y", "z"];

    /// Numeric values paired with their field names, in training-data order
    pub fn numeric_values(&self) -> [(&'static str, f64); 6] {
        [
            ("carat", self.carat),
            ("depth", self.depth),
            ("table", self.table),
            ("x", self.x),
            ("y", self.y),
            ("z", self.z),
        ]
    }
}

/// Prices for a batch of diamonds, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_price: Vec<f64>,
}

impl PredictionResult {
    pub fn new(predicted_price: Vec<f64>) -> Self {
        Self { predicted_price }
    }
}
