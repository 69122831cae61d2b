use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::common::entities::app_errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Gm,
    Ml,
    Ltr,
    Pc,
}

/// Units only convert within their family; there is no density table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
}

impl Unit {
    pub fn family(self) -> UnitFamily {
        match self {
            Unit::Kg | Unit::Gm => UnitFamily::Mass,
            Unit::Ml | Unit::Ltr => UnitFamily::Volume,
            Unit::Pc => UnitFamily::Count,
        }
    }

    /// Size of one unit expressed in the smallest unit of its family (gm, ml, pc).
    pub(crate) fn base_factor(self) -> Decimal {
        match self {
            Unit::Kg | Unit::Ltr => dec!(1000),
            Unit::Gm | Unit::Ml | Unit::Pc => Decimal::ONE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Gm => "gm",
            Unit::Ml => "ml",
            Unit::Ltr => "ltr",
            Unit::Pc => "pc",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "gm" | "g" => Ok(Unit::Gm),
            "ml" => Ok(Unit::Ml),
            "ltr" | "l" => Ok(Unit::Ltr),
            "pc" => Ok(Unit::Pc),
            other => Err(CoreError::validation(format!("unknown unit: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_aliases() {
        assert_eq!("kg".parse::<Unit>(), Ok(Unit::Kg));
        assert_eq!(" GM ".parse::<Unit>(), Ok(Unit::Gm));
        assert_eq!("g".parse::<Unit>(), Ok(Unit::Gm));
        assert_eq!("l".parse::<Unit>(), Ok(Unit::Ltr));
        assert!(matches!(
            "cup".parse::<Unit>(),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_display_matches_serde_code() {
        for unit in [Unit::Kg, Unit::Gm, Unit::Ml, Unit::Ltr, Unit::Pc] {
            let json = serde_json::to_string(&unit).unwrap();
            assert_eq!(json, format!("\"{unit}\""));
        }
    }
}
