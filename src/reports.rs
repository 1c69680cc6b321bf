use crate::benchmark::{LevelVerdict, MetricCheck};
use crate::error::{GeoCreditError, Result};
use crate::snapshot::Snapshot;
use crate::types::{
    CountRow, EnrichedRow, EnrichedVillage, ExecutiveSummary, LevelMetricRow, MapPointRow,
    RiskCategory, SaturatedRow, SentimentRow, StrategyQuadrant, WatchlistRow,
};
use crate::util::{format_int, format_number, mean};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Region selection: one kabupaten, optionally narrowed to some kecamatan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFilter {
    pub region: String,
    /// Empty means every sub-region of `region`.
    pub sub_regions: Vec<String>,
}

impl RegionFilter {
    /// Build a filter against `snapshot`. Without a region the first one in
    /// sorted order is used.
    pub fn resolve(
        snapshot: &Snapshot,
        region: Option<&str>,
        sub_regions: Vec<String>,
    ) -> Result<Self> {
        let regions = snapshot.regions();
        let region = match region {
            Some(r) if regions.contains(&r) => r.to_string(),
            Some(r) => return Err(GeoCreditError::UnknownRegion(r.to_string())),
            None => match regions.first() {
                Some(first) => first.to_string(),
                None => return Err(GeoCreditError::UnknownRegion("(empty dataset)".to_string())),
            },
        };
        Ok(Self { region, sub_regions })
    }

    fn matches(&self, village: &EnrichedVillage) -> bool {
        village.record.region == self.region
            && (self.sub_regions.is_empty()
                || self.sub_regions.contains(&village.record.sub_region))
    }

    pub fn view<'a>(&self, snapshot: &'a Snapshot) -> RegionView<'a> {
        let indices = snapshot
            .villages()
            .iter()
            .enumerate()
            .filter(|(_, v)| self.matches(v))
            .map(|(i, _)| i)
            .collect();
        RegionView { snapshot, indices }
    }
}

/// Borrowed subset of a [`Snapshot`]. Derived values come from the snapshot
/// unchanged.
#[derive(Debug, Clone)]
pub struct RegionView<'a> {
    snapshot: &'a Snapshot,
    indices: Vec<usize>,
}

impl<'a> RegionView<'a> {
    /// The whole dataset as a view.
    pub fn all(snapshot: &'a Snapshot) -> Self {
        Self { snapshot, indices: (0..snapshot.len()).collect() }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a EnrichedVillage> + '_ {
        let villages = self.snapshot.villages();
        self.indices.iter().map(move |&i| &villages[i])
    }

    fn iter_indexed(&self) -> impl Iterator<Item = (usize, &'a EnrichedVillage)> + '_ {
        let villages = self.snapshot.villages();
        self.indices.iter().map(move |&i| (i, &villages[i]))
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn enriched_row(v: &EnrichedVillage) -> EnrichedRow {
    let (r, m) = (&v.record, &v.metrics);
    EnrichedRow {
        region: r.region.clone(),
        sub_region: r.sub_region.clone(),
        village: r.village.clone(),
        lat: r.lat,
        lon: r.lon,
        total_loan: r.total_loan,
        total_deposits: r.total_deposits,
        households: r.households,
        attractiveness: r.attractiveness,
        dominant_sector: r.dominant_sector.clone(),
        slum_sites: r.flags.slum_sites,
        disasters: r.flags.disasters,
        conflicts: r.flags.conflicts,
        loan_per_household: m.loan_per_household,
        saturation_risk: m.saturation_risk,
        economic_risk: m.economic_risk,
        environmental_risk: m.environmental_risk,
        final_risk_score: m.final_risk_score,
        risk_category: m.risk_category,
        strategy_quadrant: m.strategy_quadrant.to_string(),
    }
}

pub fn executive_summary(view: &RegionView<'_>) -> ExecutiveSummary {
    ExecutiveSummary {
        villages: view.len(),
        total_exposure: view.iter().map(|v| v.record.total_loan).sum(),
        avg_risk_score: mean(view.iter().map(|v| v.metrics.final_risk_score)).unwrap_or(0.0),
        hidden_gems: view
            .iter()
            .filter(|v| v.metrics.strategy_quadrant == StrategyQuadrant::HiddenGem)
            .count(),
        high_risk_areas: view.iter().filter(|v| v.metrics.risk_category.is_elevated()).count(),
    }
}

/// One row per quadrant, zero counts included. Counts sum to the view size.
pub fn quadrant_counts(view: &RegionView<'_>) -> Vec<CountRow> {
    let mut counts: HashMap<StrategyQuadrant, usize> = HashMap::new();
    for v in view.iter() {
        *counts.entry(v.metrics.strategy_quadrant).or_default() += 1;
    }
    StrategyQuadrant::ALL
        .iter()
        .map(|q| CountRow { label: q.to_string(), count: counts.get(q).copied().unwrap_or(0) })
        .collect()
}

/// One row per risk category, zero counts included.
pub fn category_counts(view: &RegionView<'_>) -> Vec<CountRow> {
    RiskCategory::ALL
        .iter()
        .map(|c| CountRow {
            label: c.to_string(),
            count: view.iter().filter(|v| v.metrics.risk_category == *c).count(),
        })
        .collect()
}

/// Villages per dominant sector, most common first.
pub fn sector_counts(view: &RegionView<'_>) -> Vec<CountRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in view.iter() {
        *counts.entry(v.record.dominant_sector.as_str()).or_default() += 1;
    }
    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(label, count)| CountRow { label: label.to_string(), count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

/// Most saturated Red Ocean villages by loan per household.
pub fn top_saturated_red_ocean(view: &RegionView<'_>, n: usize) -> Vec<SaturatedRow> {
    let mut red: Vec<&EnrichedVillage> = view
        .iter()
        .filter(|v| v.metrics.strategy_quadrant == StrategyQuadrant::RedOcean)
        .collect();
    red.sort_by(|a, b| desc(a.metrics.loan_per_household, b.metrics.loan_per_household));
    red.into_iter()
        .take(n)
        .map(|v| SaturatedRow {
            village: v.record.village.clone(),
            sub_region: v.record.sub_region.clone(),
            loan_per_household: format_number(v.metrics.loan_per_household, 2),
        })
        .collect()
}

/// High and Critical villages, highest score first.
pub fn risk_watchlist(view: &RegionView<'_>, n: usize) -> Vec<WatchlistRow> {
    let mut elevated: Vec<&EnrichedVillage> =
        view.iter().filter(|v| v.metrics.risk_category.is_elevated()).collect();
    elevated.sort_by(|a, b| desc(a.metrics.final_risk_score, b.metrics.final_risk_score));
    elevated
        .into_iter()
        .take(n)
        .map(|v| WatchlistRow {
            village: v.record.village.clone(),
            final_risk_score: format_number(v.metrics.final_risk_score, 2),
            risk_category: v.metrics.risk_category.to_string(),
            conflicts: format_int(v.record.flags.conflicts as u64),
            disasters: format_int(v.record.flags.disasters as u64),
        })
        .collect()
}

/// Highest simulated sentiment scores in the view.
pub fn top_sentiment(view: &RegionView<'_>, n: usize) -> Vec<SentimentRow> {
    let snapshot = view.snapshot;
    let mut scored: Vec<(&EnrichedVillage, f64, u32)> = view
        .iter_indexed()
        .filter_map(|(i, v)| snapshot.sentiment_for(i).map(|s| (v, s.score, s.review_count)))
        .collect();
    scored.sort_by(|a, b| desc(a.1, b.1));
    scored
        .into_iter()
        .take(n)
        .map(|(v, score, review_count)| SentimentRow {
            village: v.record.village.clone(),
            dominant_sector: v.record.dominant_sector.clone(),
            score: format_number(score, 2),
            review_count,
        })
        .collect()
}

/// At most `limit` villages for plotting. Larger views get a seeded random
/// sample, kept in dataset order.
pub fn sample_for_chart<'a>(
    view: &RegionView<'a>,
    limit: usize,
    seed: u64,
) -> Vec<&'a EnrichedVillage> {
    if view.len() <= limit {
        return view.iter().collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, view.len(), limit).into_vec();
    picked.sort_unstable();
    let villages = view.snapshot.villages();
    picked.into_iter().map(|p| &villages[view.indices[p]]).collect()
}

/// Chart feed: a bounded sample of the view with raw numeric values.
pub fn map_points(view: &RegionView<'_>, limit: usize, seed: u64) -> Vec<MapPointRow> {
    sample_for_chart(view, limit, seed)
        .into_iter()
        .map(|v| MapPointRow {
            village: v.record.village.clone(),
            sub_region: v.record.sub_region.clone(),
            lat: v.record.lat,
            lon: v.record.lon,
            attractiveness: v.record.attractiveness,
            loan_per_household: v.metrics.loan_per_household,
            total_loan: v.record.total_loan,
            final_risk_score: v.metrics.final_risk_score,
            risk_category: v.metrics.risk_category,
            strategy_quadrant: v.metrics.strategy_quadrant.to_string(),
        })
        .collect()
}

fn metric_row(metric: &str, check: &MetricCheck) -> LevelMetricRow {
    LevelMetricRow {
        metric: metric.to_string(),
        input: format_number(check.input, 0),
        ceiling: format_number(check.ceiling, 0),
        status: check.status.to_string(),
    }
}

/// Table rows for one benchmark level. Without a requested credit amount the
/// credit row only shows the ceiling.
pub fn verdict_rows(verdict: &LevelVerdict) -> Vec<LevelMetricRow> {
    let mut rows = vec![
        metric_row("Revenue", &verdict.revenue),
        metric_row("COGS", &verdict.cogs),
        metric_row("Profit", &verdict.profit),
    ];
    rows.push(match &verdict.credit {
        Some(check) => metric_row("Credit", check),
        None => LevelMetricRow {
            metric: "Credit".to_string(),
            input: "-".to_string(),
            ceiling: format_number(verdict.credit_ceiling, 0),
            status: "Ceiling only".to_string(),
        },
    });
    rows
}
