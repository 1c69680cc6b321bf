use crate::benchmark::BenchmarkLevel;
use crate::error::{GeoCreditError, Result};
use crate::normalize::normalize;
use crate::types::{
    BenchmarkKey, BenchmarkRow, Ceilings, RawBenchmarkRow, RawVillageRow, RiskFlags, VillageRecord,
};
use crate::util::{clean_text, parse_amount, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header prefix carried by the raw village export.
pub const VILLAGE_HEADER_PREFIX: &str = "potensi_wilayah_kel_podes_pdrb_sekda_current.";

/// Identity columns: (export name, dashboard name).
const VILLAGE_REQUIRED: &[(&str, &str)] = &[
    ("nama_kabupaten", "Kabupaten"),
    ("nama_kecamatan", "Kecamatan"),
    ("nama_desa", "Desa"),
];

/// Risk flag columns that may be absent from an export.
const VILLAGE_FLAG_COLUMNS: &[(&str, &str)] = &[
    ("jumlah_lokasi_permukiman_kumuh", "Risk_Kumuh"),
    ("bencana_alam", "Risk_Bencana"),
    ("jumlah_perkelahian_masyarakat", "Risk_Konflik"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    /// Optional risk flag columns the file did not have; they load as zero.
    pub missing_flag_columns: Vec<&'static str>,
}

fn open(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(GeoCreditError::DatasetNotFound { path: path.to_path_buf() });
    }
    Ok(File::open(path)?)
}

fn has_column(headers: &StringRecord, names: &[&str]) -> bool {
    headers.iter().any(|h| names.contains(&h))
}

fn require_columns(file: &str, headers: &StringRecord, required: &[&str]) -> Result<()> {
    for column in required {
        if !has_column(headers, &[*column]) {
            return Err(GeoCreditError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

pub fn load_villages(path: &Path) -> Result<(Vec<VillageRecord>, LoadReport)> {
    let file = open(path)?;
    let (records, report) = read_villages(file, &path.display().to_string())?;
    tracing::info!(
        path = %path.display(),
        total = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "loaded village dataset"
    );
    Ok((records, report))
}

/// Parse a village export. `source` only labels errors.
pub fn read_villages<R: Read>(input: R, source: &str) -> Result<(Vec<VillageRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches(VILLAGE_HEADER_PREFIX).to_string())
        .collect();
    rdr.set_headers(headers.clone());

    for (raw, short) in VILLAGE_REQUIRED {
        if !has_column(&headers, &[*raw, *short]) {
            return Err(GeoCreditError::MissingColumn {
                file: source.to_string(),
                column: raw.to_string(),
            });
        }
    }
    let missing_flag_columns: Vec<&'static str> = VILLAGE_FLAG_COLUMNS
        .iter()
        .filter(|(raw, short)| !has_column(&headers, &[*raw, *short]))
        .map(|(_, short)| *short)
        .collect();
    if !missing_flag_columns.is_empty() {
        tracing::warn!(
            columns = ?missing_flag_columns,
            "risk flag columns absent, treating as zero"
        );
    }

    let mut report = LoadReport { missing_flag_columns, ..LoadReport::default() };
    let mut records = Vec::new();
    for result in rdr.deserialize::<RawVillageRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(row = report.total_rows, error = %e, "unreadable village row");
                report.skipped_rows += 1;
                continue;
            }
        };
        let (Some(region), Some(sub_region), Some(village)) = (
            clean_text(row.region),
            clean_text(row.sub_region),
            clean_text(row.village),
        ) else {
            report.skipped_rows += 1;
            continue;
        };

        let dominant_sector = clean_text(row.dominant_sector)
            .map(|s| normalize(&s))
            .unwrap_or_default();

        records.push(VillageRecord {
            region,
            sub_region,
            village,
            lat: parse_f64_safe(row.lat.as_deref()).unwrap_or(0.0),
            lon: parse_f64_safe(row.lon.as_deref()).unwrap_or(0.0),
            total_loan: parse_amount(row.total_loan.as_deref()),
            total_deposits: parse_amount(row.total_deposits.as_deref()),
            households: parse_amount(row.households.as_deref()),
            attractiveness: parse_amount(row.attractiveness.as_deref()),
            dominant_sector,
            flags: RiskFlags {
                slum_sites: parse_amount(row.slum_sites.as_deref()),
                disasters: parse_amount(row.disasters.as_deref()),
                conflicts: parse_amount(row.conflicts.as_deref()),
            },
        });
    }
    report.loaded_rows = records.len();
    Ok((records, report))
}

pub fn load_benchmark_table(
    path: &Path,
    level: BenchmarkLevel,
) -> Result<(Vec<BenchmarkRow>, LoadReport)> {
    let file = open(path)?;
    let (rows, report) = read_benchmark_table(file, level, &path.display().to_string())?;
    tracing::info!(
        path = %path.display(),
        level = level.number(),
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "loaded benchmark table"
    );
    Ok((rows, report))
}

/// Parse one benchmark table. Key columns pass through the sector
/// normalizer so they join against normalized village and request labels.
pub fn read_benchmark_table<R: Read>(
    input: R,
    level: BenchmarkLevel,
    source: &str,
) -> Result<(Vec<BenchmarkRow>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: StringRecord = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    rdr.set_headers(headers.clone());

    let mut required = vec!["Provinsi Usaha", "Sektor Ekonomi"];
    if level.has_sub_sector() {
        required.push("Sub Sektor Ekonomi");
    }
    if level.has_city() {
        required.push("Kabupaten/kota");
    }
    required.extend(["OMZET_MAX_WAJAR", "HPP_MAX_WAJAR", "LABA_MAX_WAJAR", "PLAFOND_MAX_WAJAR"]);
    require_columns(source, &headers, &required)?;

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawBenchmarkRow>() {
        report.total_rows += 1;
        let Some(raw) = result.ok() else {
            report.skipped_rows += 1;
            continue;
        };
        let Some(key) = benchmark_key(&raw, level) else {
            report.skipped_rows += 1;
            continue;
        };
        match ceilings(&raw) {
            Some(ceilings) => rows.push(BenchmarkRow { key, ceilings }),
            None => {
                // The row never reaches the index, so a later row with the
                // same key becomes the first one and is not a duplicate.
                tracing::warn!(
                    source,
                    level = level.number(),
                    row = report.total_rows,
                    key = ?key,
                    "benchmark row without usable ceilings dropped"
                );
                report.skipped_rows += 1;
            }
        }
    }
    if report.skipped_rows > 0 {
        tracing::warn!(
            source,
            level = level.number(),
            skipped = report.skipped_rows,
            "benchmark rows skipped for missing keys or ceilings"
        );
    }
    report.loaded_rows = rows.len();
    Ok((rows, report))
}

fn benchmark_key(raw: &RawBenchmarkRow, level: BenchmarkLevel) -> Option<BenchmarkKey> {
    let province = clean_text(raw.province.clone())?;
    let sector = normalize(&clean_text(raw.sector.clone())?);
    let sub_sector = if level.has_sub_sector() {
        Some(normalize(&clean_text(raw.sub_sector.clone())?))
    } else {
        None
    };
    let city = if level.has_city() { Some(clean_text(raw.city.clone())?) } else { None };
    Some(BenchmarkKey { province, city, sector, sub_sector })
}

fn ceilings(raw: &RawBenchmarkRow) -> Option<Ceilings> {
    Some(Ceilings {
        revenue: parse_f64_safe(raw.max_revenue.as_deref())?,
        cogs: parse_f64_safe(raw.max_cogs.as_deref())?,
        profit: parse_f64_safe(raw.max_profit.as_deref())?,
        credit: parse_f64_safe(raw.max_credit.as_deref())?,
    })
}
