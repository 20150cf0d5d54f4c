use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    Unknown,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
            Sex::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "female" | "girl" => Ok(Sex::Female),
            "male" | "boy" => Ok(Sex::Male),
            "unknown" => Ok(Sex::Unknown),
            _ => Err(format!(
                "Invalid sex '{}'. Valid options: female, male, unknown",
                s
            )),
        }
    }
}
