//! Village risk and opportunity scoring.
//!
//! [`enrich`] turns loaded [`VillageRecord`]s into [`EnrichedVillage`]s in a
//! fixed order: household guard, loan per household, the three component
//! risks, the composite score and its category, then the strategy quadrant
//! against dataset-wide means. Every step is a small pure function so the
//! individual formulas can be tested on their own.
use crate::types::{
    EnrichedVillage, RiskCategory, RiskFlags, StrategyQuadrant, VillageMetrics, VillageRecord,
};
use crate::util::mean;

/// Loan per household (in millions) at which saturation risk reaches 100.
pub const SATURATION_CEILING: f64 = 50.0;
pub const LOAN_UNIT: f64 = 1_000_000.0;

pub const SATURATION_WEIGHT: f64 = 0.3;
pub const ECONOMIC_WEIGHT: f64 = 0.3;
pub const ENVIRONMENTAL_WEIGHT: f64 = 0.4;

pub const SLUM_POINTS: f64 = 30.0;
pub const DISASTER_POINTS: f64 = 20.0;
pub const CONFLICT_POINTS: f64 = 50.0;

pub const CRITICAL_THRESHOLD: f64 = 60.0;
pub const HIGH_THRESHOLD: f64 = 40.0;
pub const MEDIUM_THRESHOLD: f64 = 20.0;

/// Household count used as a divisor. Zero or negative counts become 1.
pub fn effective_households(households: f64) -> f64 {
    if households > 0.0 {
        households
    } else {
        1.0
    }
}

pub fn loan_per_household(total_loan: f64, households: f64) -> f64 {
    (total_loan / effective_households(households)) / LOAN_UNIT
}

pub fn saturation_risk(loan_per_household: f64) -> f64 {
    (loan_per_household / SATURATION_CEILING).clamp(0.0, 1.0) * 100.0
}

/// Denominator for economic risk: the largest attractiveness in the dataset,
/// or 1 when nothing is positive.
pub fn attractiveness_scale<'a>(records: impl IntoIterator<Item = &'a VillageRecord>) -> f64 {
    let max = records
        .into_iter()
        .map(|r| r.attractiveness)
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

pub fn economic_risk(attractiveness: f64, scale: f64) -> f64 {
    100.0 - (attractiveness / scale) * 100.0
}

pub fn environmental_risk(flags: &RiskFlags) -> f64 {
    let mut score = 0.0;
    if flags.slum() {
        score += SLUM_POINTS;
    }
    if flags.disaster() {
        score += DISASTER_POINTS;
    }
    if flags.conflict() {
        score += CONFLICT_POINTS;
    }
    score
}

/// Weighted composite of the three component risks. Non-finite results are
/// reported as 0.
pub fn final_risk_score(saturation: f64, economic: f64, environmental: f64) -> f64 {
    let score = SATURATION_WEIGHT * saturation
        + ECONOMIC_WEIGHT * economic
        + ENVIRONMENTAL_WEIGHT * environmental;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

impl RiskCategory {
    /// Bucket lower bounds are inclusive: exactly 60 is Critical.
    pub fn from_score(score: f64) -> Self {
        if score >= CRITICAL_THRESHOLD {
            RiskCategory::Critical
        } else if score >= HIGH_THRESHOLD {
            RiskCategory::High
        } else if score >= MEDIUM_THRESHOLD {
            RiskCategory::Medium
        } else {
            RiskCategory::Low
        }
    }
}

/// Dataset-wide averages the quadrant split is measured against.
///
/// Always computed over the full loaded dataset; a filtered view reuses the
/// same means so classifications do not shift with the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetMeans {
    pub attractiveness: f64,
    pub loan_per_household: f64,
}

impl DatasetMeans {
    /// `None` for an empty dataset.
    pub fn compute(values: &[(f64, f64)]) -> Option<Self> {
        Some(Self {
            attractiveness: mean(values.iter().map(|v| v.0))?,
            loan_per_household: mean(values.iter().map(|v| v.1))?,
        })
    }
}

impl StrategyQuadrant {
    /// A value equal to the mean counts as "at or above", so a tie on loan
    /// per household lands in Red Ocean or High Risk.
    pub fn classify(attractiveness: f64, loan_per_household: f64, means: &DatasetMeans) -> Self {
        let attractive = attractiveness >= means.attractiveness;
        let saturated = loan_per_household >= means.loan_per_household;
        match (attractive, saturated) {
            (true, false) => StrategyQuadrant::HiddenGem,
            (true, true) => StrategyQuadrant::RedOcean,
            (false, true) => StrategyQuadrant::HighRisk,
            (false, false) => StrategyQuadrant::Dormant,
        }
    }
}

/// Per-record values that do not depend on dataset means.
struct Partial {
    loan_per_household: f64,
    saturation_risk: f64,
    economic_risk: f64,
    environmental_risk: f64,
    final_risk_score: f64,
}

fn score_record(record: &VillageRecord, scale: f64) -> Partial {
    let lph = loan_per_household(record.total_loan, record.households);
    let saturation = saturation_risk(lph);
    let economic = economic_risk(record.attractiveness, scale);
    let environmental = environmental_risk(&record.flags);
    Partial {
        loan_per_household: lph,
        saturation_risk: saturation,
        economic_risk: economic,
        environmental_risk: environmental,
        final_risk_score: final_risk_score(saturation, economic, environmental),
    }
}

/// Score and classify every record. Identical input gives identical output;
/// an empty input gives an empty output.
pub fn enrich(records: Vec<VillageRecord>) -> Vec<EnrichedVillage> {
    let scale = attractiveness_scale(&records);
    let partials: Vec<Partial> = records.iter().map(|r| score_record(r, scale)).collect();

    let pairs: Vec<(f64, f64)> = records
        .iter()
        .zip(&partials)
        .map(|(r, p)| (r.attractiveness, p.loan_per_household))
        .collect();
    let Some(means) = DatasetMeans::compute(&pairs) else {
        return Vec::new();
    };
    tracing::debug!(
        records = records.len(),
        attractiveness_scale = scale,
        mean_attractiveness = means.attractiveness,
        mean_loan_per_household = means.loan_per_household,
        "scored villages"
    );

    records
        .into_iter()
        .zip(partials)
        .map(|(record, p)| {
            let metrics = VillageMetrics {
                loan_per_household: p.loan_per_household,
                saturation_risk: p.saturation_risk,
                economic_risk: p.economic_risk,
                environmental_risk: p.environmental_risk,
                final_risk_score: p.final_risk_score,
                risk_category: RiskCategory::from_score(p.final_risk_score),
                strategy_quadrant: StrategyQuadrant::classify(
                    record.attractiveness,
                    p.loan_per_household,
                    &means,
                ),
            };
            EnrichedVillage { record, metrics }
        })
        .collect()
}

/// Means of the enriched dataset, for callers that only hold the output.
pub fn dataset_means(villages: &[EnrichedVillage]) -> Option<DatasetMeans> {
    let pairs: Vec<(f64, f64)> = villages
        .iter()
        .map(|v| (v.record.attractiveness, v.metrics.loan_per_household))
        .collect();
    DatasetMeans::compute(&pairs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn village(
        name: &str,
        loan: f64,
        households: f64,
        attractiveness: f64,
    ) -> VillageRecord {
        VillageRecord {
            region: "Kab. Contoh".to_string(),
            sub_region: "Kec. Satu".to_string(),
            village: name.to_string(),
            lat: -7.0,
            lon: 110.0,
            total_loan: loan,
            total_deposits: 0.0,
            households,
            attractiveness,
            dominant_sector: "Pertanian".to_string(),
            flags: RiskFlags::default(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn saturated_village_without_flags() {
        let out = enrich(vec![
            village("A", 500_000_000.0, 10.0, 80.0),
            village("B", 0.0, 10.0, 100.0),
        ]);
        let m = out[0].metrics;
        assert!(approx(m.loan_per_household, 50.0));
        assert!(approx(m.saturation_risk, 100.0));
        assert!(approx(m.economic_risk, 20.0));
        assert!(approx(m.environmental_risk, 0.0));
        assert!(approx(m.final_risk_score, 36.0));
        assert_eq!(m.risk_category, RiskCategory::Medium);
    }

    #[test]
    fn conflict_flag_adds_twenty_points() {
        let mut a = village("A", 500_000_000.0, 10.0, 80.0);
        a.flags.conflicts = 1.0;
        let out = enrich(vec![a, village("B", 0.0, 10.0, 100.0)]);
        let m = out[0].metrics;
        assert!(approx(m.environmental_risk, 50.0));
        assert!(approx(m.final_risk_score, 56.0));
        assert_eq!(m.risk_category, RiskCategory::High);
    }

    #[test]
    fn zero_households_divide_by_one() {
        assert!(approx(loan_per_household(10_000_000.0, 0.0), 10.0));
        assert!(approx(loan_per_household(10_000_000.0, -4.0), 10.0));
        let out = enrich(vec![village("A", 10_000_000.0, 0.0, 50.0)]);
        assert!(approx(out[0].metrics.loan_per_household, 10.0));
    }

    #[test]
    fn saturation_is_clamped() {
        assert_eq!(saturation_risk(500.0), 100.0);
        assert_eq!(saturation_risk(0.0), 0.0);
        assert!(approx(saturation_risk(25.0), 50.0));
    }

    #[test]
    fn non_positive_attractiveness_uses_unit_scale() {
        let records = vec![village("A", 0.0, 1.0, 0.0), village("B", 0.0, 1.0, 0.0)];
        assert_eq!(attractiveness_scale(&records), 1.0);
        let out = enrich(records);
        assert!(approx(out[0].metrics.economic_risk, 100.0));
    }

    #[test]
    fn environmental_points_add_up() {
        let all = RiskFlags { slum_sites: 2.0, disasters: 1.0, conflicts: 3.0 };
        assert_eq!(environmental_risk(&all), 100.0);
        let slum_only = RiskFlags { slum_sites: 1.0, ..RiskFlags::default() };
        assert_eq!(environmental_risk(&slum_only), 30.0);
        assert_eq!(environmental_risk(&RiskFlags::default()), 0.0);
    }

    #[test]
    fn category_bounds_are_closed_below() {
        assert_eq!(RiskCategory::from_score(60.0), RiskCategory::Critical);
        assert_eq!(RiskCategory::from_score(59.999), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(40.0), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(20.0), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(19.99), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Low);
    }

    #[test]
    fn quadrant_rules() {
        let means = DatasetMeans { attractiveness: 50.0, loan_per_household: 10.0 };
        assert_eq!(StrategyQuadrant::classify(60.0, 5.0, &means), StrategyQuadrant::HiddenGem);
        assert_eq!(StrategyQuadrant::classify(60.0, 15.0, &means), StrategyQuadrant::RedOcean);
        assert_eq!(StrategyQuadrant::classify(40.0, 15.0, &means), StrategyQuadrant::HighRisk);
        assert_eq!(StrategyQuadrant::classify(40.0, 5.0, &means), StrategyQuadrant::Dormant);
        // ties count as "at or above"
        assert_eq!(StrategyQuadrant::classify(50.0, 10.0, &means), StrategyQuadrant::RedOcean);
        assert_eq!(StrategyQuadrant::classify(49.0, 10.0, &means), StrategyQuadrant::HighRisk);
    }

    #[test]
    fn single_record_is_its_own_mean() {
        let out = enrich(vec![village("Solo", 30_000_000.0, 3.0, 42.0)]);
        assert_eq!(out[0].metrics.strategy_quadrant, StrategyQuadrant::RedOcean);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(enrich(Vec::new()).is_empty());
        assert_eq!(DatasetMeans::compute(&[]), None);
        assert_eq!(dataset_means(&[]), None);
    }

    #[test]
    fn means_cover_the_whole_dataset() {
        let out = enrich(vec![
            village("A", 10_000_000.0, 1.0, 90.0),
            village("B", 30_000_000.0, 1.0, 10.0),
        ]);
        let means = dataset_means(&out).unwrap();
        assert!(approx(means.attractiveness, 50.0));
        assert!(approx(means.loan_per_household, 20.0));
        assert_eq!(out[0].metrics.strategy_quadrant, StrategyQuadrant::HiddenGem);
        assert_eq!(out[1].metrics.strategy_quadrant, StrategyQuadrant::HighRisk);
    }
}
