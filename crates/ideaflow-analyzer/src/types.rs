use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

/// Structured analysis returned by the model.
///
/// Field names stay camelCase on the wire — the shape is shared with the
/// stored `ai_analysis` JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    /// Refined problem statement.
    pub problem: String,
    /// Model's own severity estimate, 1–10.
    pub pain_level: i32,
    pub target_customer: String,
    pub market_size: MarketSize,
    pub competition_level: CompetitionLevel,
    pub monetization_ideas: Vec<String>,
    pub tech_stack: Vec<String>,
    pub build_time_estimate: String,
    pub key_insights: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_round_trips_camel_case_json() {
        let json = serde_json::json!({
            "problem": "Freelancers lose billable hours to manual time tracking",
            "painLevel": 7,
            "targetCustomer": "Independent consultants billing hourly",
            "marketSize": "Medium",
            "competitionLevel": "High",
            "monetizationIdeas": ["subscription", "per-seat pricing"],
            "techStack": ["Postgres", "Rust"],
            "buildTimeEstimate": "6 weeks for MVP",
            "keyInsights": ["existing tools require manual timers"]
        });

        let analysis: AiAnalysis = serde_json::from_value(json).expect("deserialize");
        assert_eq!(analysis.pain_level, 7);
        assert_eq!(analysis.market_size, MarketSize::Medium);
        assert_eq!(analysis.competition_level, CompetitionLevel::High);

        let back = serde_json::to_value(&analysis).expect("serialize");
        assert_eq!(back["painLevel"], 7);
        assert_eq!(back["marketSize"], "Medium");
    }

    #[test]
    fn unknown_market_size_is_rejected() {
        let result = serde_json::from_value::<MarketSize>(serde_json::json!("Enormous"));
        assert!(result.is_err());
    }
}
