use crate::util::format_number;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// One row of the village dataset as it appears on disk, after the
/// `potensi_wilayah_kel_podes_pdrb_sekda_current.` header prefix is removed.
///
/// Each field accepts the raw export name and the short dashboard name.
#[derive(Debug, Default, Deserialize)]
pub struct RawVillageRow {
    #[serde(rename = "nama_kabupaten", alias = "Kabupaten", default)]
    pub region: Option<String>,
    #[serde(rename = "nama_kecamatan", alias = "Kecamatan", default)]
    pub sub_region: Option<String>,
    #[serde(rename = "nama_desa", alias = "Desa", default)]
    pub village: Option<String>,
    #[serde(rename = "latitude_desa", alias = "lat", default)]
    pub lat: Option<String>,
    #[serde(rename = "longitude_desa", alias = "lon", default)]
    pub lon: Option<String>,
    #[serde(rename = "total_pinjaman_kel", alias = "Total_Pinjaman", default)]
    pub total_loan: Option<String>,
    #[serde(rename = "total_simpanan_kel", alias = "Total_Simpanan", default)]
    pub total_deposits: Option<String>,
    #[serde(rename = "jumlah_keluarga_pengguna_listrik", alias = "Jumlah_KK", default)]
    pub households: Option<String>,
    #[serde(rename = "attractiveness_index", alias = "Skor_Potensi", default)]
    pub attractiveness: Option<String>,
    #[serde(rename = "max_tipe_usaha", alias = "Sektor_Dominan", default)]
    pub dominant_sector: Option<String>,
    #[serde(rename = "jumlah_lokasi_permukiman_kumuh", alias = "Risk_Kumuh", default)]
    pub slum_sites: Option<String>,
    #[serde(rename = "bencana_alam", alias = "Risk_Bencana", default)]
    pub disasters: Option<String>,
    #[serde(rename = "jumlah_perkelahian_masyarakat", alias = "Risk_Konflik", default)]
    pub conflicts: Option<String>,
}

/// Social and environmental incidence counts. Absent columns load as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskFlags {
    pub slum_sites: f64,
    pub disasters: f64,
    pub conflicts: f64,
}

impl RiskFlags {
    pub fn slum(&self) -> bool {
        self.slum_sites > 0.0
    }

    pub fn disaster(&self) -> bool {
        self.disasters > 0.0
    }

    pub fn conflict(&self) -> bool {
        self.conflicts > 0.0
    }
}

/// A village as handed to the metric engine: identity, inputs, no derived
/// values. Numeric fields are already zero-filled and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct VillageRecord {
    pub region: String,
    pub sub_region: String,
    pub village: String,
    pub lat: f64,
    pub lon: f64,
    pub total_loan: f64,
    pub total_deposits: f64,
    pub households: f64,
    pub attractiveness: f64,
    pub dominant_sector: String,
    pub flags: RiskFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] =
        [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High, RiskCategory::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
            RiskCategory::Critical => "Critical",
        }
    }

    /// High and Critical villages go on the watchlist.
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskCategory::High | RiskCategory::Critical)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrategyQuadrant {
    HiddenGem,
    RedOcean,
    HighRisk,
    Dormant,
}

impl StrategyQuadrant {
    pub const ALL: [StrategyQuadrant; 4] = [
        StrategyQuadrant::HiddenGem,
        StrategyQuadrant::RedOcean,
        StrategyQuadrant::HighRisk,
        StrategyQuadrant::Dormant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyQuadrant::HiddenGem => "Hidden Gem (Grow)",
            StrategyQuadrant::RedOcean => "Red Ocean (Compete)",
            StrategyQuadrant::HighRisk => "High Risk (Stop)",
            StrategyQuadrant::Dormant => "Dormant (Monitor)",
        }
    }
}

impl fmt::Display for StrategyQuadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values derived once per load by [`crate::metrics::enrich`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VillageMetrics {
    /// Millions of currency units per household.
    pub loan_per_household: f64,
    pub saturation_risk: f64,
    pub economic_risk: f64,
    pub environmental_risk: f64,
    pub final_risk_score: f64,
    pub risk_category: RiskCategory,
    pub strategy_quadrant: StrategyQuadrant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedVillage {
    pub record: VillageRecord,
    pub metrics: VillageMetrics,
}

/// One row of a benchmark table as it appears on disk. Level 1 has no
/// city or sub-sector columns, Level 2 has no city column.
#[derive(Debug, Default, Deserialize)]
pub struct RawBenchmarkRow {
    #[serde(rename = "Provinsi Usaha", default)]
    pub province: Option<String>,
    #[serde(rename = "Kabupaten/kota", default)]
    pub city: Option<String>,
    #[serde(rename = "Sektor Ekonomi", default)]
    pub sector: Option<String>,
    #[serde(rename = "Sub Sektor Ekonomi", default)]
    pub sub_sector: Option<String>,
    #[serde(rename = "OMZET_MAX_WAJAR", default)]
    pub max_revenue: Option<String>,
    #[serde(rename = "HPP_MAX_WAJAR", default)]
    pub max_cogs: Option<String>,
    #[serde(rename = "LABA_MAX_WAJAR", default)]
    pub max_profit: Option<String>,
    #[serde(rename = "PLAFOND_MAX_WAJAR", default)]
    pub max_credit: Option<String>,
}

/// Upper bounds of plausible self-reported financials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ceilings {
    pub revenue: f64,
    pub cogs: f64,
    pub profit: f64,
    pub credit: f64,
}

/// Lookup key of a benchmark row. `city` is set only on Level 3 rows and
/// `sub_sector` only on Level 2 and 3 rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BenchmarkKey {
    pub province: String,
    pub city: Option<String>,
    pub sector: String,
    pub sub_sector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRow {
    pub key: BenchmarkKey,
    pub ceilings: Ceilings,
}

// ---------------------------------------------------------------------------
// Report rows.
// ---------------------------------------------------------------------------

fn two_decimals(v: &f64) -> String {
    format_number(*v, 2)
}

/// One village with its inputs and every derived value, as exported to
/// `enriched_villages.csv`.
///
/// Input columns keep the dashboard names the loader accepts, so the export
/// can be read back. Numbers are written raw; only the markdown preview
/// formats them, and it leaves the input columns out.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct EnrichedRow {
    #[serde(rename = "Kabupaten")]
    #[tabled(rename = "Kabupaten")]
    pub region: String,
    #[serde(rename = "Kecamatan")]
    #[tabled(rename = "Kecamatan")]
    pub sub_region: String,
    #[serde(rename = "Desa")]
    #[tabled(rename = "Desa")]
    pub village: String,
    #[tabled(skip)]
    pub lat: f64,
    #[tabled(skip)]
    pub lon: f64,
    #[serde(rename = "Total_Pinjaman")]
    #[tabled(skip)]
    pub total_loan: f64,
    #[serde(rename = "Total_Simpanan")]
    #[tabled(skip)]
    pub total_deposits: f64,
    #[serde(rename = "Jumlah_KK")]
    #[tabled(skip)]
    pub households: f64,
    #[serde(rename = "Skor_Potensi")]
    #[tabled(skip)]
    pub attractiveness: f64,
    #[serde(rename = "Sektor_Dominan")]
    #[tabled(rename = "Sektor_Dominan")]
    pub dominant_sector: String,
    #[serde(rename = "Risk_Kumuh")]
    #[tabled(skip)]
    pub slum_sites: f64,
    #[serde(rename = "Risk_Bencana")]
    #[tabled(skip)]
    pub disasters: f64,
    #[serde(rename = "Risk_Konflik")]
    #[tabled(skip)]
    pub conflicts: f64,
    #[serde(rename = "Loan_per_HH")]
    #[tabled(rename = "Loan_per_HH", display_with = "two_decimals")]
    pub loan_per_household: f64,
    #[serde(rename = "Saturation_Risk")]
    #[tabled(rename = "Saturation_Risk", display_with = "two_decimals")]
    pub saturation_risk: f64,
    #[serde(rename = "Economic_Risk")]
    #[tabled(rename = "Economic_Risk", display_with = "two_decimals")]
    pub economic_risk: f64,
    #[serde(rename = "Environmental_Risk")]
    #[tabled(rename = "Environmental_Risk", display_with = "two_decimals")]
    pub environmental_risk: f64,
    #[serde(rename = "Final_Risk_Score")]
    #[tabled(rename = "Final_Risk_Score", display_with = "two_decimals")]
    pub final_risk_score: f64,
    #[serde(rename = "Risk_Category")]
    #[tabled(rename = "Risk_Category")]
    pub risk_category: RiskCategory,
    #[serde(rename = "Strategy_Quadrant")]
    #[tabled(rename = "Strategy_Quadrant")]
    pub strategy_quadrant: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CountRow {
    #[serde(rename = "Kategori")]
    #[tabled(rename = "Kategori")]
    pub label: String,
    #[serde(rename = "Jumlah")]
    #[tabled(rename = "Jumlah")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SaturatedRow {
    #[serde(rename = "Desa")]
    #[tabled(rename = "Desa")]
    pub village: String,
    #[serde(rename = "Kecamatan")]
    #[tabled(rename = "Kecamatan")]
    pub sub_region: String,
    #[serde(rename = "Loan_per_HH")]
    #[tabled(rename = "Loan_per_HH")]
    pub loan_per_household: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WatchlistRow {
    #[serde(rename = "Desa")]
    #[tabled(rename = "Desa")]
    pub village: String,
    #[serde(rename = "Final_Risk_Score")]
    #[tabled(rename = "Final_Risk_Score")]
    pub final_risk_score: String,
    #[serde(rename = "Risk_Category")]
    #[tabled(rename = "Risk_Category")]
    pub risk_category: String,
    #[serde(rename = "Risk_Konflik")]
    #[tabled(rename = "Risk_Konflik")]
    pub conflicts: String,
    #[serde(rename = "Risk_Bencana")]
    #[tabled(rename = "Risk_Bencana")]
    pub disasters: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SentimentRow {
    #[serde(rename = "Desa")]
    #[tabled(rename = "Desa")]
    pub village: String,
    #[serde(rename = "Sektor_Dominan")]
    #[tabled(rename = "Sektor_Dominan")]
    pub dominant_sector: String,
    #[serde(rename = "Sentiment_Score")]
    #[tabled(rename = "Sentiment_Score")]
    pub score: String,
    #[serde(rename = "Review_Count")]
    #[tabled(rename = "Review_Count")]
    pub review_count: u32,
}

/// One metric of a benchmark level, for the terminal table.
#[derive(Debug, Tabled, Clone)]
pub struct LevelMetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Input")]
    pub input: String,
    #[tabled(rename = "Max")]
    pub ceiling: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Headline KPIs for a filtered view, written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub villages: usize,
    pub total_exposure: f64,
    pub avg_risk_score: f64,
    pub hidden_gems: usize,
    pub high_risk_areas: usize,
}

/// Point feed for map and scatter charts.
#[derive(Debug, Serialize, Clone)]
pub struct MapPointRow {
    #[serde(rename = "Desa")]
    pub village: String,
    #[serde(rename = "Kecamatan")]
    pub sub_region: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "Skor_Potensi")]
    pub attractiveness: f64,
    #[serde(rename = "Loan_per_HH")]
    pub loan_per_household: f64,
    #[serde(rename = "Total_Pinjaman")]
    pub total_loan: f64,
    #[serde(rename = "Final_Risk_Score")]
    pub final_risk_score: f64,
    #[serde(rename = "Risk_Category")]
    pub risk_category: RiskCategory,
    #[serde(rename = "Strategy_Quadrant")]
    pub strategy_quadrant: String,
}
