use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::correlation::{AlignedPoint, Strength};

/// The fixed health-vs-economy pairings on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    ObesityVsHealthExpenditure,
    LifeExpectancyVsGdp,
    DiabetesVsGdp,
    MortalityVsHealthExpenditure,
}

impl AnalysisType {
    /// (health indicator, economic indicator) codes.
    pub fn indicators(self) -> (&'static str, &'static str) {
        match self {
            AnalysisType::ObesityVsHealthExpenditure => ("SH.STA.OWAD.ZS", "SH.XPD.CHEX.PC.CD"),
            AnalysisType::LifeExpectancyVsGdp => ("SP.DYN.LE00.IN", "NY.GDP.PCAP.CD"),
            AnalysisType::DiabetesVsGdp => ("SH.STA.DIAB.ZS", "NY.GDP.PCAP.CD"),
            AnalysisType::MortalityVsHealthExpenditure => ("SH.DYN.NCOM.ZS", "SH.XPD.CHEX.GD.ZS"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAnalysisRequest {
    pub analysis_type: AnalysisType,
    pub country_code: String,
    pub year_start: i32,
    pub year_end: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnalysisRequest {
    pub name: String,
    #[serde(flatten)]
    pub run: RunAnalysisRequest,
}

#[derive(Debug, Deserialize)]
pub struct RenameAnalysisRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_type: AnalysisType,
    pub country_code: String,
    pub year_start: i32,
    pub year_end: i32,
    pub health_indicator: String,
    pub economic_indicator: String,
    pub correlation: f64,
    pub strength: Strength,
    pub points: Vec<AlignedPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysisResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_types_use_kebab_case_names() {
        let t: AnalysisType = serde_json::from_str("\"life-expectancy-vs-gdp\"").unwrap();
        assert_eq!(t, AnalysisType::LifeExpectancyVsGdp);
        assert_eq!(t.indicators().1, "NY.GDP.PCAP.CD");
        assert!(serde_json::from_str::<AnalysisType>("\"wealth-vs-happiness\"").is_err());
    }

    #[test]
    fn save_request_flattens_run_fields() {
        let req: SaveAnalysisRequest = serde_json::from_str(
            r#"{"name":"Spain GDP","analysisType":"diabetes-vs-gdp","countryCode":"ES","yearStart":2000,"yearEnd":2020}"#,
        )
        .unwrap();
        assert_eq!(req.name, "Spain GDP");
        assert_eq!(req.run.year_end, 2020);
    }
}
