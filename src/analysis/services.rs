use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    correlation::{align, classify, pearson},
    dataset::DatasetSource,
    dto::{AnalysisResult, RunAnalysisRequest},
};
use crate::error::{AppError, AppResult, Violation};

/// Earliest year the indicator datasets cover.
pub const FIRST_YEAR: i32 = 1960;

pub(crate) fn is_valid_country_code(code: &str) -> bool {
    lazy_static! {
        static ref COUNTRY_RE: Regex = Regex::new(r"^[A-Za-z]{2,3}$").unwrap();
    }
    COUNTRY_RE.is_match(code)
}

fn check_request(req: &RunAnalysisRequest) -> AppResult<String> {
    let country = req.country_code.trim();
    if country.is_empty() {
        return Err(AppError::validation("countryCode", Violation::Required));
    }
    if !is_valid_country_code(country) {
        return Err(AppError::validation("countryCode", Violation::Malformed));
    }
    let last_year = OffsetDateTime::now_utc().year();
    let years = (FIRST_YEAR as f64, last_year as f64);
    if !(FIRST_YEAR..=last_year).contains(&req.year_start) {
        return Err(AppError::validation(
            "yearStart",
            Violation::OutOfRange { min: years.0, max: years.1 },
        ));
    }
    if !(req.year_start..=last_year).contains(&req.year_end) {
        return Err(AppError::validation(
            "yearEnd",
            Violation::OutOfRange {
                min: req.year_start as f64,
                max: years.1,
            },
        ));
    }
    Ok(country.to_ascii_uppercase())
}

/// Fetches both indicator series and correlates them over the shared years.
pub async fn run(source: &dyn DatasetSource, req: RunAnalysisRequest) -> AppResult<AnalysisResult> {
    let country = check_request(&req)?;
    let (health_code, economic_code) = req.analysis_type.indicators();

    let (health, economic) = tokio::try_join!(
        source.series(&country, health_code, req.year_start, req.year_end),
        source.series(&country, economic_code, req.year_start, req.year_end),
    )
    .map_err(|e| {
        warn!(error = ?e, %country, "dataset unavailable");
        AppError::Transport(e.to_string())
    })?;

    let points = align(&health, &economic);
    let xs: Vec<f64> = points.iter().map(|p| p.health).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.economic).collect();
    let correlation = pearson(&xs, &ys).ok_or(AppError::InsufficientData)?;

    info!(
        %country,
        analysis = ?req.analysis_type,
        points = points.len(),
        correlation,
        "analysis computed"
    );
    Ok(AnalysisResult {
        analysis_type: req.analysis_type,
        country_code: country,
        year_start: req.year_start,
        year_end: req.year_end,
        health_indicator: health_code.to_string(),
        economic_indicator: economic_code.to_string(),
        correlation,
        strength: classify(correlation),
        points,
    })
}

pub fn check_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name", Violation::Required));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        correlation::Strength,
        dataset::fake::FakeDataset,
        dto::AnalysisType,
    };

    fn request(country: &str, start: i32, end: i32) -> RunAnalysisRequest {
        RunAnalysisRequest {
            analysis_type: AnalysisType::LifeExpectancyVsGdp,
            country_code: country.into(),
            year_start: start,
            year_end: end,
        }
    }

    fn dataset() -> FakeDataset {
        FakeDataset::default()
            .with("SP.DYN.LE00.IN", &[(2000, 10.0), (2001, 20.0), (2002, 30.0), (2003, 35.0)])
            .with("NY.GDP.PCAP.CD", &[(2000, 30.0), (2001, 20.0), (2002, 10.0)])
    }

    #[tokio::test]
    async fn inverse_series_correlate_strongly_negative() {
        let result = run(&dataset(), request("es", 2000, 2005)).await.unwrap();
        assert!((result.correlation + 1.0).abs() < 1e-9);
        assert_eq!(result.strength, Strength::Strong);
        assert_eq!(result.country_code, "ES");
        assert_eq!(result.points.len(), 3);
        assert_eq!(result.health_indicator, "SP.DYN.LE00.IN");
    }

    #[tokio::test]
    async fn too_few_shared_years_is_insufficient() {
        let err = run(&dataset(), request("ES", 2002, 2003)).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientData));

        let err = run(&FakeDataset::default(), request("ES", 2000, 2010)).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientData));
    }

    #[tokio::test]
    async fn dataset_failures_are_transport_errors() {
        let source = FakeDataset {
            fail: true,
            ..Default::default()
        };
        let err = run(&source, request("ES", 2000, 2010)).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn bad_requests_fail_before_fetching() {
        let source = FakeDataset {
            fail: true,
            ..Default::default()
        };
        for (req, field) in [
            (request("", 2000, 2010), "countryCode"),
            (request("ESP1", 2000, 2010), "countryCode"),
            (request("ES", 1900, 2010), "yearStart"),
            (request("ES", 2010, 2000), "yearEnd"),
        ] {
            match run(&source, req).await {
                Err(AppError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(check_name("  Spain  ").unwrap(), "Spain");
        assert!(check_name("   ").is_err());
    }
}
