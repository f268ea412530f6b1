use serde::{Deserialize, Serialize};

/// 报告语气
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Objective,
    Critical,
    Optimistic,
    Balanced,
    Skeptical,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tone::Objective => "objective",
            Tone::Critical => "critical",
            Tone::Optimistic => "optimistic",
            Tone::Balanced => "balanced",
            Tone::Skeptical => "skeptical",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "objective" => Ok(Tone::Objective),
            "critical" => Ok(Tone::Critical),
            "optimistic" => Ok(Tone::Optimistic),
            "balanced" => Ok(Tone::Balanced),
            "skeptical" => Ok(Tone::Skeptical),
            _ => Err(format!("Unknown tone: {}", s)),
        }
    }
}

impl Tone {
    /// 宽松解析：未知语气回退为 Objective
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::debug!("未知的语气 `{}`，回退为 objective", s);
            Tone::Objective
        })
    }

    /// 写作提示词中的语气说明
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Objective => "Objective (impartial and unbiased presentation of facts and findings)",
            Tone::Critical => {
                "Critical (judging the validity and relevance of the research and its conclusions)"
            }
            Tone::Optimistic => {
                "Optimistic (highlighting positive findings and potential benefits)"
            }
            Tone::Balanced => {
                "Balanced (weighing arguments for and against with equal care)"
            }
            Tone::Skeptical => {
                "Skeptical (questioning assumptions, evidence quality and overstated claims)"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tones_parse_case_insensitively() {
        assert_eq!("Skeptical".parse::<Tone>().unwrap(), Tone::Skeptical);
        assert_eq!("CRITICAL".parse::<Tone>().unwrap(), Tone::Critical);
        assert_eq!(Tone::parse_or_default("OpTiMiStIc"), Tone::Optimistic);
    }

    #[test]
    fn test_unknown_tones_fall_back_to_objective() {
        for raw in [
            "cheerful",
            "",
            "formal",
            "objective!",
            "skeptic",
            "sceptical",
            " balanced ",
        ] {
            assert_eq!(Tone::parse_or_default(raw), Tone::Objective, "tone {:?}", raw);
        }
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for tone in [
            Tone::Objective,
            Tone::Critical,
            Tone::Optimistic,
            Tone::Balanced,
            Tone::Skeptical,
        ] {
            assert_eq!(tone.to_string().parse::<Tone>().unwrap(), tone);
        }
    }
}
