//! Sector taxonomy cleanup.
//!
//! The village dataset and the benchmark tables spell sector labels
//! differently (`toko_kelontong` vs `Toko/Warung Kelontong`). Both sides go
//! through [`normalize`] at load time so benchmark joins compare like with
//! like.
use once_cell::sync::Lazy;
use std::collections::HashMap;

const SECTOR_LABELS: &[(&str, &str)] = &[
    ("pertanian", "Pertanian"),
    ("perdagangan_besar_eceran", "Perdagangan Besar dan Eceran"),
    ("industri_makanan", "Industri Makanan"),
    ("industri_kayu", "Industri Kayu"),
    ("industri_logam", "Industri Logam Mulia dan Bahan dari Logam"),
    ("industri_kain", "Industri Kain/Tenun"),
    ("industri_gerabah", "Industri Gerabah/Keramik/Batu"),
    ("industri_anyaman", "Industri Anyaman"),
    ("toko_kelontong", "Toko/Warung Kelontong"),
    ("warung_makan", "Warung/Kedai Makanan Minuman"),
    ("restoran", "Restoran/Rumah Makan"),
    ("minimarket", "Minimarket/Swalayan"),
    ("pasar", "Pasar"),
    ("hotel", "Hotel/Penginapan"),
    ("koperasi", "Koperasi"),
    ("bengkel", "Bengkel Kendaraan Bermotor"),
];

static LOOKUP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SECTOR_LABELS.iter().copied().collect());

fn lookup_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Canonical label for a raw sector label. Unknown labels come back unchanged.
pub fn normalize(raw: &str) -> String {
    match LOOKUP.get(lookup_key(raw).as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => raw.to_string(),
    }
}

/// Number of raw labels with a canonical mapping.
pub fn known_label_count() -> usize {
    LOOKUP.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes() {
        assert_eq!(normalize("toko_kelontong"), "Toko/Warung Kelontong");
        assert_eq!(normalize("  Industri-Makanan "), "Industri Makanan");
        assert_eq!(normalize("PERDAGANGAN BESAR ECERAN"), "Perdagangan Besar dan Eceran");
    }

    #[test]
    fn unknown_labels_pass_through() {
        assert_eq!(normalize("Jasa Keuangan"), "Jasa Keuangan");
        assert_eq!(normalize(" spaced "), " spaced ");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn canonical_labels_are_fixed_points() {
        for (_, canonical) in SECTOR_LABELS {
            assert_eq!(normalize(canonical), *canonical);
        }
    }

    #[test]
    fn table_has_no_key_collisions() {
        assert_eq!(known_label_count(), SECTOR_LABELS.len());
    }
}
