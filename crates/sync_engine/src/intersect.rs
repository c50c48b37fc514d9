//! Feature-set intersection across records of one timestamp.

use std::collections::BTreeSet;

use contracts::{DetectionRecord, FeatureId};

/// Restricts records to the features every one of them observed.
///
/// Callers are responsible for passing records of the same instant; the
/// timestamps are not re-checked here.
pub struct PairIntersector;

impl PairIntersector {
    /// Feature ids present in every record (empty for no records).
    pub fn common_feature_ids(records: &[&DetectionRecord]) -> BTreeSet<FeatureId> {
        let Some((first, rest)) = records.split_first() else {
            return BTreeSet::new();
        };

        first
            .feature_ids()
            .filter(|id| rest.iter().all(|r| r.contains_feature(*id)))
            .collect()
    }

    /// Intersected copies, in input order. Inputs are left untouched.
    pub fn intersect(records: &[&DetectionRecord]) -> Vec<DetectionRecord> {
        let common = Self::common_feature_ids(records);
        records.iter().map(|r| r.restricted_to(&common)).collect()
    }

    /// Intersect records the caller already owns.
    pub fn intersect_in_place(records: &mut [DetectionRecord]) {
        let refs: Vec<&DetectionRecord> = records.iter().collect();
        let common = Self::common_feature_ids(&refs);
        for record in records.iter_mut() {
            record.retain_features(&common);
        }
    }
}
