use std::fmt;

use serde::{Deserialize, Serialize};

/// The four staged labels of the crystallization process, in process order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Unsaturated,
    Labile,
    Intermediate,
    Metastable,
}

impl Phase {
    /// All phases in process order. Substring matching walks this order, so
    /// the first phase named in a response wins.
    pub const ORDERED: [Phase; 4] = [
        Phase::Unsaturated,
        Phase::Labile,
        Phase::Intermediate,
        Phase::Metastable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Unsaturated => "unsaturated",
            Phase::Labile => "labile",
            Phase::Intermediate => "intermediate",
            Phase::Metastable => "metastable",
        }
    }

    /// Parse a corpus phase label, tolerating case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Phase> {
        match label.trim().to_lowercase().as_str() {
            "unsaturated" => Some(Phase::Unsaturated),
            "labile" => Some(Phase::Labile),
            "intermediate" => Some(Phase::Intermediate),
            "metastable" => Some(Phase::Metastable),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_all_labels() {
        for phase in Phase::ORDERED {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::parse(" Labile "), Some(Phase::Labile));
        assert_eq!(Phase::parse("supersaturated"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Phase::Metastable).unwrap();
        assert_eq!(json, "\"metastable\"");
    }
}
