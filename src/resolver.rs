//! Candidate resolution for unresolved config records.
//!
//! Tiers, first match wins:
//! 1. Sibling link: a linked config with the same base key names a real donor
//! 2. Exactly one donor with same base key and path family
//! 3. Exactly one donor with same base key
//! 4. Several donors: ambiguous, left for review
//! 5. No donor at all
//!
//! Resolution only reads the shared index, so records can be resolved in any
//! order and in parallel.

use crate::index::DonorIndex;
use crate::models::{CandidateConfidence, CandidateMethod, CandidateStatus, Record};
use crate::normalize::{path_family, VariantTokens};

/// How tier 1 treats linked configs that disagree on the donor for a base key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingLinkPolicy {
    /// Use the donor id from the last linked config in dataset order
    #[default]
    LastWriteWins,
    /// More than one resolvable donor id makes the record ambiguous
    DetectConflicts,
}

/// Outcome for one record.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub base_key: String,
    pub path_family: String,
    pub status: CandidateStatus,
    pub method: Option<CandidateMethod>,
    pub confidence: Option<CandidateConfidence>,
    pub candidate_count: usize,
    pub donor: Option<&'a Record>,
}

impl<'a> Resolution<'a> {
    fn candidate(
        base_key: String,
        path_family: String,
        method: CandidateMethod,
        confidence: CandidateConfidence,
        donor: &'a Record,
    ) -> Self {
        Self {
            base_key,
            path_family,
            status: CandidateStatus::Candidate,
            method: Some(method),
            confidence: Some(confidence),
            candidate_count: 1,
            donor: Some(donor),
        }
    }

    fn ambiguous(
        base_key: String,
        path_family: String,
        method: CandidateMethod,
        candidate_count: usize,
    ) -> Self {
        Self {
            base_key,
            path_family,
            status: CandidateStatus::Ambiguous,
            method: Some(method),
            confidence: Some(CandidateConfidence::Review),
            candidate_count,
            donor: None,
        }
    }

    fn no_candidate(base_key: String, path_family: String) -> Self {
        Self {
            base_key,
            path_family,
            status: CandidateStatus::NoCandidate,
            method: None,
            confidence: None,
            candidate_count: 0,
            donor: None,
        }
    }
}

/// Tier-1 finding before it is turned into a `Resolution`.
enum SiblingMatch<'a> {
    Donor(&'a Record),
    Conflict(usize),
}

pub struct Resolver<'i, 'a> {
    index: &'i DonorIndex<'a>,
    variants: &'i VariantTokens,
    policy: SiblingLinkPolicy,
}

impl<'i, 'a> Resolver<'i, 'a> {
    pub fn new(index: &'i DonorIndex<'a>, variants: &'i VariantTokens) -> Self {
        Self {
            index,
            variants,
            policy: SiblingLinkPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SiblingLinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn sibling_match(&self, base_key: &str) -> Option<SiblingMatch<'a>> {
        let linked = self.index.linked_donors(base_key)?;
        match self.policy {
            SiblingLinkPolicy::LastWriteWins => {
                self.index.donor_by_id(&linked.last).map(SiblingMatch::Donor)
            }
            SiblingLinkPolicy::DetectConflicts => {
                let resolvable: Vec<&'a Record> = linked
                    .distinct
                    .iter()
                    .filter_map(|id| self.index.donor_by_id(id))
                    .collect();
                match resolvable.as_slice() {
                    [] => None,
                    [donor] => Some(SiblingMatch::Donor(*donor)),
                    many => Some(SiblingMatch::Conflict(many.len())),
                }
            }
        }
    }

    /// Resolve one unresolved config record. Never fails; missing fields
    /// degrade to `no_candidate`.
    pub fn resolve(&self, record: &Record) -> Resolution<'a> {
        let base = self.variants.base_key(&record.object_name);
        let fam = path_family(&record.path);

        // Tier 1: authoritative link on a sibling variant
        match self.sibling_match(&base) {
            Some(SiblingMatch::Donor(donor)) => {
                return Resolution::candidate(
                    base,
                    fam,
                    CandidateMethod::SiblingLinkedBase,
                    CandidateConfidence::High,
                    donor,
                );
            }
            Some(SiblingMatch::Conflict(count)) => {
                return Resolution::ambiguous(
                    base,
                    fam,
                    CandidateMethod::SiblingLinkedConflict,
                    count,
                );
            }
            None => {}
        }

        let same_base = self.index.same_base(&base);
        let same_base_fam = self.index.same_base_family(&base, &fam);

        // Tier 2: name and content family agree
        if let [donor] = same_base_fam.as_slice() {
            return Resolution::candidate(
                base,
                fam,
                CandidateMethod::BaseKeyPathFamily,
                CandidateConfidence::High,
                *donor,
            );
        }

        // Tier 3: unique by name alone
        if let [donor] = same_base.as_slice() {
            return Resolution::candidate(
                base,
                fam,
                CandidateMethod::BaseKeyUnique,
                CandidateConfidence::Medium,
                *donor,
            );
        }

        // Tier 4: never pick among equals
        if same_base_fam.len() > 1 {
            let count = same_base_fam.len();
            return Resolution::ambiguous(
                base,
                fam,
                CandidateMethod::BaseKeyPathFamilyAmbiguous,
                count,
            );
        }
        if same_base.len() > 1 {
            let count = same_base.len();
            return Resolution::ambiguous(base, fam, CandidateMethod::BaseKeyAmbiguous, count);
        }

        Resolution::no_candidate(base, fam)
    }
}
