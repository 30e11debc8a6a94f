//! Named fuzz targets
//!
//! Each target pairs a generator with a property of the risk model or the
//! geodesy helpers. The CLI runs them all with the counting runner; the
//! tests below run the same checks through `proptest!` to get shrinking.

use crate::generators::{coordinates, poi_set, poi_set_and_permutation, pois_with_counts, risk_support_counts};
use crate::runner::FuzzRunner;
use perimeter_risk::evaluator::{classify_total, residual_for, GeoRiskDirection};
use perimeter_risk::{distance_m, evaluate, CategoryTally, Coordinates, Poi, RiskLevel};

pub const TARGETS: [(&str, &str); 6] = [
    ("total_risk_rules", "total risk follows the PR/PA thresholds"),
    ("residual_within_total", "residual risk never exceeds total risk"),
    ("direction_matches_counts", "geographic direction compares PR with PA"),
    ("order_independent", "evaluation ignores POI order"),
    ("distance_symmetric", "haversine distance is symmetric and non-negative"),
    ("distance_self_zero", "distance from a point to itself is zero"),
];

/// Expected total risk written out from the rule table
fn expected_total(risk: usize, support: usize) -> RiskLevel {
    if risk >= 4 {
        RiskLevel::High
    } else if risk <= 1 && support >= 3 {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

pub fn check_total_rules(&(risk, support): &(usize, usize)) -> Result<(), String> {
    let assessment = evaluate(&pois_with_counts(risk, support));
    let expected = expected_total(risk, support);
    if assessment.total_risk != expected || classify_total(risk, support) != expected {
        return Err(format!(
            "PR={} PA={}: expected {}, got {}",
            risk, support, expected, assessment.total_risk
        ));
    }
    Ok(())
}

pub fn check_residual(pois: &Vec<Poi>) -> Result<(), String> {
    let a = evaluate(pois);
    if !a.is_consistent() || a.residual_risk != residual_for(a.total_risk) {
        return Err(format!("total={} residual={}", a.total_risk, a.residual_risk));
    }
    Ok(())
}

pub fn check_direction(pois: &Vec<Poi>) -> Result<(), String> {
    let tally = CategoryTally::from_pois(pois);
    let expected = match tally.risk.cmp(&tally.support) {
        std::cmp::Ordering::Greater => GeoRiskDirection::A,
        std::cmp::Ordering::Equal => GeoRiskDirection::I,
        std::cmp::Ordering::Less => GeoRiskDirection::D,
    };
    let got = evaluate(pois).geographic_risk;
    if got != expected {
        return Err(format!("PR={} PA={}: expected {}, got {}", tally.risk, tally.support, expected, got));
    }
    Ok(())
}

pub fn check_order_independent((original, shuffled): &(Vec<Poi>, Vec<Poi>)) -> Result<(), String> {
    let a = evaluate(original);
    let b = evaluate(shuffled);
    if a != b {
        return Err(format!("{:?} != {:?}", a, b));
    }
    Ok(())
}

pub fn check_distance_symmetric(&(a, b): &(Coordinates, Coordinates)) -> Result<(), String> {
    let ab = distance_m(Some(a), Some(b));
    let ba = distance_m(Some(b), Some(a));
    if ab.is_nan() || ab < 0.0 || (ab - ba).abs() > 1e-6 {
        return Err(format!("d(a,b)={} d(b,a)={}", ab, ba));
    }
    Ok(())
}

pub fn check_distance_self(a: &Coordinates) -> Result<(), String> {
    let d = distance_m(Some(*a), Some(*a));
    if d.abs() > 1e-6 {
        return Err(format!("self distance {}", d));
    }
    Ok(())
}

/// Run every target with the runner's configuration
pub fn run_all(runner: &mut FuzzRunner) {
    runner.run("total_risk_rules", risk_support_counts(), check_total_rules);
    runner.run("residual_within_total", poi_set(0..16), check_residual);
    runner.run("direction_matches_counts", poi_set(0..16), check_direction);
    runner.run("order_independent", poi_set_and_permutation(0..12), check_order_independent);
    runner.run("distance_symmetric", (coordinates(), coordinates()), check_distance_symmetric);
    runner.run("distance_self_zero", coordinates(), check_distance_self);
}
