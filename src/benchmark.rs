//! Reasonableness checks of self-reported business financials.
//!
//! Three benchmark tables bound plausible revenue, COGS, profit and credit
//! for a location and sector at decreasing specificity:
//!
//! | level | key |
//! |---|---|
//! | 1 | province, sector |
//! | 2 | province, sector, sub-sector |
//! | 3 | province, city, sector, sub-sector |
//!
//! [`BenchmarkValidator::validate`] looks every level up on its own and
//! returns all three results together. A level with no matching row is
//! reported as unavailable; it never hides the other levels.
use crate::config::DataSettings;
use crate::error::Result;
use crate::loader::load_benchmark_table;
use crate::normalize::normalize;
use crate::types::{BenchmarkKey, BenchmarkRow, Ceilings};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Serialized as its level number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum BenchmarkLevel {
    /// Level 1: province and sector.
    Province,
    /// Level 2: province, sector and sub-sector.
    SubSector,
    /// Level 3: province, city, sector and sub-sector.
    City,
}

impl BenchmarkLevel {
    /// Most specific first, the order results are presented in.
    pub const DISPLAY_ORDER: [BenchmarkLevel; 3] =
        [BenchmarkLevel::City, BenchmarkLevel::SubSector, BenchmarkLevel::Province];

    pub fn number(&self) -> u8 {
        match self {
            BenchmarkLevel::Province => 1,
            BenchmarkLevel::SubSector => 2,
            BenchmarkLevel::City => 3,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BenchmarkLevel::Province => "Province & Sector",
            BenchmarkLevel::SubSector => "Province & Sub-sector",
            BenchmarkLevel::City => "City/Regency & Sub-sector",
        }
    }

    pub fn has_city(&self) -> bool {
        matches!(self, BenchmarkLevel::City)
    }

    pub fn has_sub_sector(&self) -> bool {
        !matches!(self, BenchmarkLevel::Province)
    }

    /// Drop the key parts this level does not match on.
    fn project(&self, key: &BenchmarkKey) -> BenchmarkKey {
        BenchmarkKey {
            province: key.province.clone(),
            city: if self.has_city() { key.city.clone() } else { None },
            sector: key.sector.clone(),
            sub_sector: if self.has_sub_sector() { key.sub_sector.clone() } else { None },
        }
    }
}

impl From<BenchmarkLevel> for u8 {
    fn from(level: BenchmarkLevel) -> Self {
        level.number()
    }
}

impl fmt::Display for BenchmarkLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {} ({})", self.number(), self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub province: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorSelection {
    pub name: String,
    pub sub_sector: String,
}

impl SectorSelection {
    /// Run both labels through the sector normalizer, as the tables were at
    /// load time.
    pub fn normalized(&self) -> Self {
        Self { name: normalize(&self.name), sub_sector: normalize(&self.sub_sector) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Financials {
    pub revenue: f64,
    pub cogs: f64,
    pub profit: f64,
    /// Credit amount the applicant asks for, if known.
    pub requested_credit: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Reasonable,
    Unreasonable,
}

impl Status {
    /// The ceiling itself is still reasonable.
    pub fn check(input: f64, ceiling: f64) -> Self {
        if input <= ceiling {
            Status::Reasonable
        } else {
            Status::Unreasonable
        }
    }

    pub fn is_reasonable(&self) -> bool {
        matches!(self, Status::Reasonable)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Reasonable => f.write_str("Reasonable"),
            Status::Unreasonable => f.write_str("Unreasonable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricCheck {
    pub input: f64,
    pub ceiling: f64,
    pub status: Status,
}

impl MetricCheck {
    fn new(input: f64, ceiling: f64) -> Self {
        Self { input, ceiling, status: Status::check(input, ceiling) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelVerdict {
    pub revenue: MetricCheck,
    pub cogs: MetricCheck,
    pub profit: MetricCheck,
    /// Requested credit against the ceiling. Informational; does not feed
    /// `status`.
    pub credit: Option<MetricCheck>,
    pub credit_ceiling: f64,
    /// Reasonable only when revenue, COGS and profit all are.
    pub status: Status,
}

impl LevelVerdict {
    pub fn assess(ceilings: &Ceilings, financials: &Financials) -> Self {
        let revenue = MetricCheck::new(financials.revenue, ceilings.revenue);
        let cogs = MetricCheck::new(financials.cogs, ceilings.cogs);
        let profit = MetricCheck::new(financials.profit, ceilings.profit);
        let all_reasonable = [revenue, cogs, profit].iter().all(|m| m.status.is_reasonable());
        Self {
            revenue,
            cogs,
            profit,
            credit: financials.requested_credit.map(|c| MetricCheck::new(c, ceilings.credit)),
            credit_ceiling: ceilings.credit,
            status: if all_reasonable { Status::Reasonable } else { Status::Unreasonable },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelResult {
    pub level: BenchmarkLevel,
    pub available: bool,
    pub verdict: Option<LevelVerdict>,
}

impl LevelResult {
    fn new(level: BenchmarkLevel, verdict: Option<LevelVerdict>) -> Self {
        Self { level, available: verdict.is_some(), verdict }
    }
}

/// One result per benchmark level, most specific first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub levels: Vec<LevelResult>,
}

impl ValidationReport {
    pub fn level(&self, level: BenchmarkLevel) -> Option<&LevelResult> {
        self.levels.iter().find(|r| r.level == level)
    }

    pub fn available(&self) -> impl Iterator<Item = &LevelResult> {
        self.levels.iter().filter(|r| r.available)
    }

    /// `false` means no benchmark exists for this combination at any level,
    /// usually a label the user can correct.
    pub fn has_any_match(&self) -> bool {
        self.levels.iter().any(|r| r.available)
    }
}

/// The three benchmark tables as loaded, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkTables {
    pub level1: Vec<BenchmarkRow>,
    pub level2: Vec<BenchmarkRow>,
    pub level3: Vec<BenchmarkRow>,
}

impl BenchmarkTables {
    pub fn load(data: &DataSettings) -> Result<Self> {
        let (level1, _) = load_benchmark_table(&data.benchmark_level1, BenchmarkLevel::Province)?;
        let (level2, _) = load_benchmark_table(&data.benchmark_level2, BenchmarkLevel::SubSector)?;
        let (level3, _) = load_benchmark_table(&data.benchmark_level3, BenchmarkLevel::City)?;
        Ok(Self { level1, level2, level3 })
    }

    pub fn rows(&self, level: BenchmarkLevel) -> &[BenchmarkRow] {
        match level {
            BenchmarkLevel::Province => &self.level1,
            BenchmarkLevel::SubSector => &self.level2,
            BenchmarkLevel::City => &self.level3,
        }
    }
}

/// Immutable lookup over [`BenchmarkTables`].
#[derive(Debug, Clone)]
pub struct BenchmarkValidator {
    tables: BenchmarkTables,
    index: BTreeMap<(BenchmarkLevel, BenchmarkKey), usize>,
    duplicates: BTreeMap<BenchmarkLevel, usize>,
}

impl BenchmarkValidator {
    /// Index every table by its level key. When a key repeats, the first row
    /// in file order wins and the repeat is counted and logged.
    pub fn new(tables: BenchmarkTables) -> Self {
        let mut index = BTreeMap::new();
        let mut duplicates = BTreeMap::new();
        for level in BenchmarkLevel::DISPLAY_ORDER {
            for (pos, row) in tables.rows(level).iter().enumerate() {
                let key = level.project(&row.key);
                if index.contains_key(&(level, key.clone())) {
                    tracing::warn!(
                        level = level.number(),
                        key = ?key,
                        "duplicate benchmark key, keeping first row"
                    );
                    *duplicates.entry(level).or_insert(0) += 1;
                } else {
                    index.insert((level, key), pos);
                }
            }
        }
        Self { tables, index, duplicates }
    }

    pub fn tables(&self) -> &BenchmarkTables {
        &self.tables
    }

    /// Repeated keys seen while indexing `level`.
    pub fn duplicate_count(&self, level: BenchmarkLevel) -> usize {
        self.duplicates.get(&level).copied().unwrap_or(0)
    }

    pub fn lookup(
        &self,
        level: BenchmarkLevel,
        location: &Location,
        sector: &SectorSelection,
    ) -> Option<&BenchmarkRow> {
        let key = level.project(&BenchmarkKey {
            province: location.province.clone(),
            city: Some(location.city.clone()),
            sector: sector.name.clone(),
            sub_sector: Some(sector.sub_sector.clone()),
        });
        let pos = self.index.get(&(level, key))?;
        self.tables.rows(level).get(*pos)
    }

    /// Check `financials` against every benchmark level. Labels must already
    /// be canonical (see [`SectorSelection::normalized`]); matching is exact.
    pub fn validate(
        &self,
        location: &Location,
        sector: &SectorSelection,
        financials: &Financials,
    ) -> ValidationReport {
        let levels = BenchmarkLevel::DISPLAY_ORDER
            .iter()
            .map(|&level| {
                let verdict = self
                    .lookup(level, location, sector)
                    .map(|row| LevelVerdict::assess(&row.ceilings, financials));
                tracing::debug!(
                    level = level.number(),
                    available = verdict.is_some(),
                    status = ?verdict.as_ref().map(|v| v.status),
                    "benchmark level checked"
                );
                LevelResult::new(level, verdict)
            })
            .collect();
        ValidationReport { levels }
    }

    // Option lists for the input form.

    pub fn provinces(&self) -> Vec<String> {
        distinct(self.tables.level1.iter().map(|r| r.key.province.as_str()))
    }

    pub fn cities(&self, province: &str) -> Vec<String> {
        distinct(
            self.tables
                .level3
                .iter()
                .filter(|r| r.key.province == province)
                .filter_map(|r| r.key.city.as_deref()),
        )
    }

    pub fn sectors(&self) -> Vec<String> {
        distinct(self.tables.level1.iter().map(|r| r.key.sector.as_str()))
    }

    pub fn sub_sectors(&self, sector: &str) -> Vec<String> {
        distinct(
            self.tables
                .level2
                .iter()
                .filter(|r| r.key.sector == sector)
                .filter_map(|r| r.key.sub_sector.as_deref()),
        )
    }

    /// Every sub-sector label in the Level 2 table.
    pub fn all_sub_sectors(&self) -> Vec<String> {
        distinct(self.tables.level2.iter().filter_map(|r| r.key.sub_sector.as_deref()))
    }
}

fn distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    labels.collect::<BTreeSet<_>>().into_iter().map(str::to_string).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(
        province: &str,
        city: Option<&str>,
        sector: &str,
        sub_sector: Option<&str>,
        ceiling: f64,
    ) -> BenchmarkRow {
        BenchmarkRow {
            key: BenchmarkKey {
                province: province.to_string(),
                city: city.map(str::to_string),
                sector: sector.to_string(),
                sub_sector: sub_sector.map(str::to_string),
            },
            ceilings: Ceilings {
                revenue: ceiling,
                cogs: ceiling,
                profit: ceiling,
                credit: ceiling / 2.0,
            },
        }
    }

    fn location() -> Location {
        Location { province: "X".to_string(), city: "Y".to_string() }
    }

    fn groceries() -> SectorSelection {
        SectorSelection { name: "Retail".to_string(), sub_sector: "Groceries".to_string() }
    }

    fn financials(v: f64) -> Financials {
        Financials { revenue: v, cogs: v, profit: v, requested_credit: None }
    }

    #[test]
    fn only_level_one_matches() {
        let validator = BenchmarkValidator::new(BenchmarkTables {
            level1: vec![row("X", None, "Retail", None, 100.0)],
            level2: vec![row("X", None, "Retail", Some("Bakery"), 100.0)],
            level3: vec![],
        });
        let report = validator.validate(&location(), &groceries(), &financials(50.0));
        assert!(report.has_any_match());
        assert!(report.level(BenchmarkLevel::Province).unwrap().available);
        assert!(!report.level(BenchmarkLevel::SubSector).unwrap().available);
        assert!(!report.level(BenchmarkLevel::City).unwrap().available);
        assert_eq!(report.available().count(), 1);
    }

    #[test]
    fn ceiling_is_inclusive() {
        let ceilings = Ceilings { revenue: 100.0, cogs: 80.0, profit: 20.0, credit: 50.0 };
        let exact = Financials { revenue: 100.0, cogs: 80.0, profit: 20.0, requested_credit: None };
        assert_eq!(LevelVerdict::assess(&ceilings, &exact).status, Status::Reasonable);

        let over = Financials { profit: 20.01, ..exact };
        let verdict = LevelVerdict::assess(&ceilings, &over);
        assert_eq!(verdict.profit.status, Status::Unreasonable);
        assert_eq!(verdict.revenue.status, Status::Reasonable);
        assert_eq!(verdict.status, Status::Unreasonable);
        assert_eq!(verdict.credit_ceiling, 50.0);
    }

    #[test]
    fn requested_credit_does_not_gate_status() {
        let ceilings = Ceilings { revenue: 100.0, cogs: 80.0, profit: 20.0, credit: 50.0 };
        let f = Financials { revenue: 10.0, cogs: 5.0, profit: 5.0, requested_credit: Some(75.0) };
        let verdict = LevelVerdict::assess(&ceilings, &f);
        assert_eq!(verdict.credit.unwrap().status, Status::Unreasonable);
        assert_eq!(verdict.status, Status::Reasonable);
    }

    #[test]
    fn first_duplicate_wins() {
        let validator = BenchmarkValidator::new(BenchmarkTables {
            level1: vec![
                row("X", None, "Retail", None, 100.0),
                row("X", None, "Retail", None, 999.0),
            ],
            ..BenchmarkTables::default()
        });
        assert_eq!(validator.duplicate_count(BenchmarkLevel::Province), 1);
        let hit = validator
            .lookup(BenchmarkLevel::Province, &location(), &groceries())
            .unwrap();
        assert_eq!(hit.ceilings.revenue, 100.0);
    }

    #[test]
    fn city_is_not_part_of_level_two_key() {
        let validator = BenchmarkValidator::new(BenchmarkTables {
            level2: vec![row("X", None, "Retail", Some("Groceries"), 100.0)],
            level3: vec![row("X", Some("Z"), "Retail", Some("Groceries"), 100.0)],
            ..BenchmarkTables::default()
        });
        let report = validator.validate(&location(), &groceries(), &financials(1.0));
        assert!(report.level(BenchmarkLevel::SubSector).unwrap().available);
        assert!(!report.level(BenchmarkLevel::City).unwrap().available);
    }

    #[test]
    fn no_match_anywhere() {
        let validator = BenchmarkValidator::new(BenchmarkTables::default());
        let report = validator.validate(&location(), &groceries(), &financials(1.0));
        assert!(!report.has_any_match());
        assert_eq!(report.levels.len(), 3);
        let order: Vec<u8> = report.levels.iter().map(|r| r.level.number()).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn json_reports_level_numbers() {
        let validator = BenchmarkValidator::new(BenchmarkTables::default());
        let report = validator.validate(&location(), &groceries(), &financials(1.0));
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["levels"][0]["level"], 3);
        assert_eq!(v["levels"][2]["level"], 1);
        assert_eq!(v["levels"][0]["available"], false);
        assert!(v["levels"][0]["verdict"].is_null());
    }

    #[test]
    fn labels_must_match_exactly() {
        let validator = BenchmarkValidator::new(BenchmarkTables {
            level1: vec![row("X", None, "Retail", None, 100.0)],
            ..BenchmarkTables::default()
        });
        let sloppy = SectorSelection { name: "retail".to_string(), sub_sector: String::new() };
        let report = validator.validate(&location(), &sloppy, &financials(1.0));
        assert!(!report.has_any_match());
    }

    #[test]
    fn catalog_lists_are_sorted_and_distinct() {
        let validator = BenchmarkValidator::new(BenchmarkTables {
            level1: vec![
                row("JAWA TENGAH", None, "Retail", None, 1.0),
                row("DI YOGYAKARTA", None, "Pertanian", None, 1.0),
                row("JAWA TENGAH", None, "Pertanian", None, 1.0),
            ],
            level2: vec![
                row("JAWA TENGAH", None, "Retail", Some("Groceries"), 1.0),
                row("JAWA TENGAH", None, "Retail", Some("Bakery"), 1.0),
                row("JAWA TENGAH", None, "Pertanian", Some("Padi"), 1.0),
            ],
            level3: vec![
                row("JAWA TENGAH", Some("KOTA SEMARANG"), "Retail", Some("Groceries"), 1.0),
                row("JAWA TENGAH", Some("KAB. BANYUMAS"), "Retail", Some("Groceries"), 1.0),
                row("DI YOGYAKARTA", Some("KOTA YOGYAKARTA"), "Retail", Some("Groceries"), 1.0),
            ],
        });
        assert_eq!(validator.provinces(), vec!["DI YOGYAKARTA", "JAWA TENGAH"]);
        assert_eq!(validator.sectors(), vec!["Pertanian", "Retail"]);
        assert_eq!(validator.cities("JAWA TENGAH"), vec!["KAB. BANYUMAS", "KOTA SEMARANG"]);
        assert_eq!(validator.sub_sectors("Retail"), vec!["Bakery", "Groceries"]);
        assert_eq!(validator.all_sub_sectors(), vec!["Bakery", "Groceries", "Padi"]);
    }

    #[test]
    fn request_labels_normalize_like_tables() {
        let s = SectorSelection {
            name: "perdagangan_besar_eceran".to_string(),
            sub_sector: "toko_kelontong".to_string(),
        }
        .normalized();
        assert_eq!(s.name, "Perdagangan Besar dan Eceran");
        assert_eq!(s.sub_sector, "Toko/Warung Kelontong");
    }
}
