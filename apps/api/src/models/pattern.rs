use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    TitleKeyword,
    Company,
    Source,
    Location,
    LowScoreBand,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::TitleKeyword => "TITLE_KEYWORD",
            PatternType::Company => "COMPANY",
            PatternType::Source => "SOURCE",
            PatternType::Location => "LOCATION",
            PatternType::LowScoreBand => "LOW_SCORE_BAND",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TITLE_KEYWORD" => Ok(PatternType::TitleKeyword),
            "COMPANY" => Ok(PatternType::Company),
            "SOURCE" => Ok(PatternType::Source),
            "LOCATION" => Ok(PatternType::Location),
            "LOW_SCORE_BAND" => Ok(PatternType::LowScoreBand),
            other => Err(format!("unknown pattern type '{other}'")),
        }
    }
}

/// A learned rejection signal. `frequency` only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionPattern {
    pub user_id: Uuid,
    pub pattern_type: PatternType,
    pub pattern_value: String,
    pub frequency: i32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_type_str_roundtrip() {
        for kind in [
            PatternType::TitleKeyword,
            PatternType::Company,
            PatternType::Source,
            PatternType::Location,
            PatternType::LowScoreBand,
        ] {
            assert_eq!(kind.as_str().parse::<PatternType>().unwrap(), kind);
        }
        assert!("KEYWORD".parse::<PatternType>().is_err());
    }

    #[test]
    fn test_pattern_type_serde_matches_db_labels() {
        let json = serde_json::to_string(&PatternType::LowScoreBand).unwrap();
        assert_eq!(json, "\"LOW_SCORE_BAND\"");
    }
}
