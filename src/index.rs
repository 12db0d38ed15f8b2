//! Dataset partitioning and donor lookup structures.
//!
//! Built once per run from the full record set and read-only afterwards.
//! Donor positions (`usize`) index into `DonorIndex::donors`, which keeps
//! dataset order.

use rustc_hash::FxHashMap;

use crate::models::Record;
use crate::normalize::{path_family, VariantTokens};

// ============================================================================
// Type Aliases
// ============================================================================

/// Base key -> donor positions, dataset order
pub type BaseKeyIndex = FxHashMap<String, Vec<usize>>;

/// Base key -> path family -> donor positions, dataset order
pub type BaseKeyFamilyIndex = FxHashMap<String, FxHashMap<String, Vec<usize>>>;

// ============================================================================
// Partition
// ============================================================================

/// Records split by role. Records that are neither (other model types,
/// raw geometry without a bounding box) are dropped.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub donors: Vec<&'a Record>,
    pub linked_configs: Vec<&'a Record>,
    pub unresolved_configs: Vec<&'a Record>,
    /// Records of any role whose id is missing or blank
    pub missing_ids: usize,
}

impl<'a> Partition<'a> {
    /// First unresolved config with exactly this object name.
    pub fn unresolved_named(&self, name: &str) -> Option<&'a Record> {
        self.unresolved_configs
            .iter()
            .find(|r| r.object_name == name)
            .copied()
    }
}

pub fn partition(records: &[Record]) -> Partition<'_> {
    let mut parts = Partition::default();
    for record in records {
        if record.id.trim().is_empty() {
            parts.missing_ids += 1;
        }
        if record.is_donor() {
            parts.donors.push(record);
        } else if record.is_linked_config() {
            parts.linked_configs.push(record);
        } else if record.is_unresolved_config() {
            parts.unresolved_configs.push(record);
        }
    }
    parts
}

// ============================================================================
// Donor Index
// ============================================================================

/// Donor ids recorded by linked configs sharing one base key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedDonors {
    /// Id from the last linked config seen (last write wins)
    pub last: String,
    /// Every distinct id seen, first-seen order
    pub distinct: Vec<String>,
}

impl LinkedDonors {
    fn new(id: &str) -> Self {
        Self {
            last: id.to_string(),
            distinct: vec![id.to_string()],
        }
    }

    fn push(&mut self, id: &str) {
        self.last = id.to_string();
        if !self.distinct.iter().any(|d| d == id) {
            self.distinct.push(id.to_string());
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.distinct.len() > 1
    }
}

pub struct DonorIndex<'a> {
    donors: Vec<&'a Record>,
    by_base_key: BaseKeyIndex,
    by_base_key_family: BaseKeyFamilyIndex,
    donors_by_id: FxHashMap<&'a str, usize>,
    linked_by_base_key: FxHashMap<String, LinkedDonors>,
    /// Donors whose id was already taken by an earlier donor
    pub duplicate_donor_ids: usize,
    /// Base keys whose linked configs name more than one donor id
    pub conflicting_base_keys: usize,
}

impl<'a> DonorIndex<'a> {
    pub fn build(parts: &Partition<'a>, variants: &VariantTokens) -> Self {
        let mut index = Self {
            donors: parts.donors.clone(),
            by_base_key: BaseKeyIndex::default(),
            by_base_key_family: BaseKeyFamilyIndex::default(),
            donors_by_id: FxHashMap::default(),
            linked_by_base_key: FxHashMap::default(),
            duplicate_donor_ids: 0,
            conflicting_base_keys: 0,
        };

        for (pos, &donor) in parts.donors.iter().enumerate() {
            // Blank ids stay out of the id map; linked lookups never use them
            if !donor.id.is_empty()
                && index.donors_by_id.insert(donor.id.as_str(), pos).is_some()
            {
                index.duplicate_donor_ids += 1;
            }

            let key = variants.base_key(&donor.object_name);
            if key.is_empty() {
                continue;
            }
            index
                .by_base_key_family
                .entry(key.clone())
                .or_default()
                .entry(path_family(&donor.path))
                .or_default()
                .push(pos);
            index.by_base_key.entry(key).or_default().push(pos);
        }

        for config in &parts.linked_configs {
            let key = variants.base_key(&config.object_name);
            let donor_id = config.linked_donor_id();
            if key.is_empty() || donor_id.is_empty() {
                continue;
            }
            match index.linked_by_base_key.get_mut(&key) {
                Some(linked) => linked.push(donor_id),
                None => {
                    index
                        .linked_by_base_key
                        .insert(key, LinkedDonors::new(donor_id));
                }
            }
        }

        index.conflicting_base_keys = index
            .linked_by_base_key
            .values()
            .filter(|l| l.is_conflict())
            .count();

        index
    }

    fn collect(&self, positions: Option<&Vec<usize>>) -> Vec<&'a Record> {
        positions
            .map(|p| p.iter().map(|&i| self.donors[i]).collect())
            .unwrap_or_default()
    }

    /// Donors sharing a base key, dataset order. Empty for unknown keys.
    pub fn same_base(&self, base_key: &str) -> Vec<&'a Record> {
        self.collect(self.by_base_key.get(base_key))
    }

    /// Donors sharing both base key and path family, dataset order.
    pub fn same_base_family(&self, base_key: &str, family: &str) -> Vec<&'a Record> {
        self.collect(
            self.by_base_key_family
                .get(base_key)
                .and_then(|families| families.get(family)),
        )
    }

    /// Donor with this id; the last one in dataset order if ids repeat.
    pub fn donor_by_id(&self, id: &str) -> Option<&'a Record> {
        self.donors_by_id.get(id).map(|&i| self.donors[i])
    }

    /// Donor ids recorded by linked configs with this base key.
    pub fn linked_donors(&self, base_key: &str) -> Option<&LinkedDonors> {
        self.linked_by_base_key.get(base_key)
    }

    pub fn donor_count(&self) -> usize {
        self.donors.len()
    }

    pub fn base_key_count(&self) -> usize {
        self.by_base_key.len()
    }

    pub fn linked_base_key_count(&self) -> usize {
        self.linked_by_base_key.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn donor(id: &str, name: &str, path: &str) -> Record {
        Record {
            id: id.into(),
            object_name: name.into(),
            model_type: "Raw P3D".into(),
            path: path.into(),
            bbox_min_visual: json!([0, 0, 0]),
            bbox_max_visual: json!([1, 1, 1]),
            ..Default::default()
        }
    }

    fn linked(id: &str, name: &str, donor_id: &str) -> Record {
        Record {
            id: id.into(),
            object_name: name.into(),
            model_type: "Config".into(),
            dimensions_source: "bbox_linked_p3d".into(),
            bbox_linked_from_id: donor_id.into(),
            ..Default::default()
        }
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_partition_roles() {
        let records = vec![
            donor("D1", "tent", "a/b"),
            Record {
                id: "R1".into(),
                model_type: "Raw P3D".into(),
                ..Default::default()
            },
            linked("L1", "Tent_Red", "D1"),
            Record {
                id: "C1".into(),
                model_type: "Config".into(),
                ..Default::default()
            },
            Record {
                id: "X1".into(),
                model_type: "Preset".into(),
                ..Default::default()
            },
        ];
        let parts = partition(&records);
        assert_eq!(ids(&parts.donors), vec!["D1"]);
        assert_eq!(ids(&parts.linked_configs), vec!["L1"]);
        assert_eq!(ids(&parts.unresolved_configs), vec!["C1"]);
        assert_eq!(parts.missing_ids, 0);
    }

    #[test]
    fn test_unresolved_named_keeps_path() {
        let records = vec![
            donor("D1", "Barrel_Red", "dz/structures/props"),
            Record {
                id: "C1".into(),
                object_name: "Barrel_Green".into(),
                model_type: "Config".into(),
                path: "dz/structures/props/cfg".into(),
                ..Default::default()
            },
            Record {
                id: "C2".into(),
                object_name: "Barrel_Green".into(),
                model_type: "Config".into(),
                ..Default::default()
            },
        ];
        let parts = partition(&records);
        let found = parts.unresolved_named("Barrel_Green").unwrap();
        assert_eq!(found.id, "C1");
        assert_eq!(path_family(&found.path), "dz/structures/props");
        assert!(parts.unresolved_named("Barrel_Red").is_none());
        assert!(parts.unresolved_named("barrel_green").is_none());
    }

    #[test]
    fn test_partition_counts_missing_ids() {
        let records = vec![
            donor("", "Barrel_Red", "a/b"),
            donor("D2", "Barrel_Blue", "a/b"),
            Record {
                id: "  ".into(),
                model_type: "Config".into(),
                ..Default::default()
            },
            Record {
                model_type: "Preset".into(),
                ..Default::default()
            },
        ];
        let parts = partition(&records);
        assert_eq!(parts.missing_ids, 3);
        assert_eq!(parts.donors.len(), 2);
        assert_eq!(parts.unresolved_configs.len(), 1);

        let index = DonorIndex::build(&parts, &VariantTokens::default());
        assert!(index.donor_by_id("").is_none());
        assert_eq!(index.same_base("barrel").len(), 2);
    }

    #[test]
    fn test_base_key_index_keeps_dataset_order() {
        let records = vec![
            donor("D2", "Barrel_Red", "dz/structures/props"),
            donor("D1", "Barrel_Blue", "dz/vehicles/parts"),
            donor("D3", "Crate", "dz/structures/props"),
            donor("D4", "land_", "dz/structures/props"),
        ];
        let parts = partition(&records);
        let index = DonorIndex::build(&parts, &VariantTokens::default());

        assert_eq!(ids(&index.same_base("barrel")), vec!["D2", "D1"]);
        assert_eq!(
            ids(&index.same_base_family("barrel", "dz/vehicles/parts")),
            vec!["D1"]
        );
        assert!(index.same_base_family("barrel", "dz/other").is_empty());
        assert!(index.same_base("missing").is_empty());
        // Empty base key is never indexed
        assert!(index.same_base("").is_empty());
        assert_eq!(index.base_key_count(), 2);
        assert_eq!(index.donor_count(), 4);
    }

    #[test]
    fn test_donor_by_id_last_wins() {
        let records = vec![
            donor("D1", "Barrel", "a/b/c"),
            donor("D1", "Crate", "a/b/c"),
        ];
        let parts = partition(&records);
        let index = DonorIndex::build(&parts, &VariantTokens::default());
        assert_eq!(index.duplicate_donor_ids, 1);
        assert_eq!(index.donor_by_id("D1").unwrap().object_name, "Crate");
        assert!(index.donor_by_id("D9").is_none());
    }

    #[test]
    fn test_linked_donors_last_write_wins_and_conflicts() {
        let records = vec![
            linked("L1", "Tent_Red", "D1"),
            linked("L2", "Tent_Green", " D2 "),
            linked("L3", "Tent_Olive", "D1"),
            linked("L4", "Crate_Blue", ""),
            linked("L5", "", "D3"),
        ];
        let parts = partition(&records);
        let index = DonorIndex::build(&parts, &VariantTokens::default());

        let tent = index.linked_donors("tent").unwrap();
        assert_eq!(tent.last, "D1");
        assert_eq!(tent.distinct, vec!["D1", "D2"]);
        assert!(tent.is_conflict());
        assert_eq!(index.conflicting_base_keys, 1);
        assert!(index.linked_donors("crate").is_none());
        assert_eq!(index.linked_base_key_count(), 1);
    }
}
