use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// The six canonical price columns of a daily history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceField {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "close")]
    Close,
    #[serde(rename = "adj_close")]
    AdjustedClose,
    #[serde(rename = "volume")]
    Volume,
}

impl PriceField {
    pub const ALL: [Self; 6] = [
        Self::Open,
        Self::High,
        Self::Low,
        Self::Close,
        Self::AdjustedClose,
        Self::Volume,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::AdjustedClose => "adj_close",
            Self::Volume => "volume",
        }
    }

    /// Human-facing column label used in chart axis titles.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Low => "Low",
            Self::Close => "Close",
            Self::AdjustedClose => "Adj Close",
            Self::Volume => "Volume",
        }
    }
}

impl Display for PriceField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceField {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "adj_close" | "adjusted_close" => Ok(Self::AdjustedClose),
            "volume" => Ok(Self::Volume),
            other => Err(ValidationError::InvalidPriceField {
                value: other.to_owned(),
            }),
        }
    }
}

/// The nine forecasting models the dashboard offers.
///
/// The serialized ids match the original model list of the dashboard:
/// exponential smoothing plus eight reduced-regression models, each fitted
/// after conditional deseasonalization and detrending (`_cds_dt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "exp_smooth")]
    ExpSmooth,
    #[serde(rename = "lr_cds_dt")]
    Linear,
    #[serde(rename = "en_cds_dt")]
    ElasticNet,
    #[serde(rename = "ridge_cds_dt")]
    Ridge,
    #[serde(rename = "lasso_cds_dt")]
    Lasso,
    #[serde(rename = "lar_cds_dt")]
    Lar,
    #[serde(rename = "llar_cds_dt")]
    LassoLar,
    #[serde(rename = "br_cds_dt")]
    BayesianRidge,
    #[serde(rename = "huber_cds_dt")]
    Huber,
}

impl ModelId {
    pub const ALL: [Self; 9] = [
        Self::ExpSmooth,
        Self::Linear,
        Self::ElasticNet,
        Self::Ridge,
        Self::Lasso,
        Self::Lar,
        Self::LassoLar,
        Self::BayesianRidge,
        Self::Huber,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExpSmooth => "exp_smooth",
            Self::Linear => "lr_cds_dt",
            Self::ElasticNet => "en_cds_dt",
            Self::Ridge => "ridge_cds_dt",
            Self::Lasso => "lasso_cds_dt",
            Self::Lar => "lar_cds_dt",
            Self::LassoLar => "llar_cds_dt",
            Self::BayesianRidge => "br_cds_dt",
            Self::Huber => "huber_cds_dt",
        }
    }
}

impl Display for ModelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == normalized)
            .ok_or(ValidationError::InvalidModelId { value: normalized })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_price_field_aliases() {
        assert_eq!(
            PriceField::from_str("Adj Close").expect("must parse"),
            PriceField::AdjustedClose
        );
        assert_eq!(
            PriceField::from_str("close").expect("must parse"),
            PriceField::Close
        );
    }

    #[test]
    fn rejects_unknown_price_field() {
        let err = PriceField::from_str("vwap").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidPriceField { .. }));
    }

    #[test]
    fn model_ids_round_trip_through_strings() {
        for model in ModelId::ALL {
            assert_eq!(ModelId::from_str(model.as_str()).expect("must parse"), model);
        }
    }

    #[test]
    fn rejects_unknown_model() {
        let err = ModelId::from_str("arima").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidModelId { .. }));
    }
}
