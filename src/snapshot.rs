use crate::metrics::{dataset_means, enrich, DatasetMeans};
use crate::sentiment::{simulate, MarketSentiment};
use crate::types::{EnrichedVillage, VillageRecord};
use std::collections::BTreeSet;

/// Scored dataset for one session.
///
/// Built once after loading and read-only afterwards. Reports borrow from it;
/// nothing recomputes derived values from a filtered subset.
#[derive(Debug, Clone)]
pub struct Snapshot {
    villages: Vec<EnrichedVillage>,
    means: Option<DatasetMeans>,
    sentiment: Vec<MarketSentiment>,
}

impl Snapshot {
    pub fn build(records: Vec<VillageRecord>, sentiment_seed: u64) -> Self {
        let villages = enrich(records);
        let means = dataset_means(&villages);
        let sentiment = simulate(villages.len(), sentiment_seed);
        Self { villages, means, sentiment }
    }

    pub fn villages(&self) -> &[EnrichedVillage] {
        &self.villages
    }

    /// `None` when the dataset is empty.
    pub fn means(&self) -> Option<DatasetMeans> {
        self.means
    }

    pub fn len(&self) -> usize {
        self.villages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.villages.is_empty()
    }

    /// Simulated sentiment for the village at `index` in [`Self::villages`].
    pub fn sentiment_for(&self, index: usize) -> Option<&MarketSentiment> {
        self.sentiment.get(index)
    }

    /// Distinct regions (kabupaten), sorted.
    pub fn regions(&self) -> Vec<&str> {
        self.villages
            .iter()
            .map(|v| v.record.region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct sub-regions (kecamatan) of `region`, sorted.
    pub fn sub_regions(&self, region: &str) -> Vec<&str> {
        self.villages
            .iter()
            .filter(|v| v.record.region == region)
            .map(|v| v.record.sub_region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::village;

    fn in_region(name: &str, region: &str, sub_region: &str) -> VillageRecord {
        let mut v = village(name, 1_000_000.0, 1.0, 10.0);
        v.region = region.to_string();
        v.sub_region = sub_region.to_string();
        v
    }

    #[test]
    fn lists_regions_and_sub_regions() {
        let snap = Snapshot::build(
            vec![
                in_region("a", "SEMARANG", "TUGU"),
                in_region("b", "BANYUMAS", "AJIBARANG"),
                in_region("c", "BANYUMAS", "CILONGOK"),
                in_region("d", "BANYUMAS", "AJIBARANG"),
            ],
            42,
        );
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.regions(), vec!["BANYUMAS", "SEMARANG"]);
        assert_eq!(snap.sub_regions("BANYUMAS"), vec!["AJIBARANG", "CILONGOK"]);
        assert!(snap.sub_regions("KUDUS").is_empty());
        assert!(snap.sentiment_for(3).is_some());
        assert!(snap.sentiment_for(4).is_none());
    }

    #[test]
    fn empty_snapshot() {
        let snap = Snapshot::build(Vec::new(), 42);
        assert!(snap.is_empty());
        assert_eq!(snap.means(), None);
        assert!(snap.regions().is_empty());
    }
}
