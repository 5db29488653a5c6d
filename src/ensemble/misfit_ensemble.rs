//! Ensemble-wide misfit bookkeeping keyed by realization id.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::buffer::{Buffer, BufferError};
use crate::ensemble::member::MisfitMember;

/// Marker at the start of a persisted ensemble record ("MFTS").
pub const ENSEMBLE_MAGIC: i32 = 0x4d46_5453;

/// Misfit members for every realization in an ensemble.
#[derive(Debug)]
pub struct MisfitEnsemble {
    history_length: usize,
    members: BTreeMap<usize, MisfitMember>,
}

impl MisfitEnsemble {
    pub fn new(history_length: usize) -> Self {
        Self {
            history_length,
            members: BTreeMap::new(),
        }
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// Number of realizations with a member record.
    pub fn ens_size(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, iens: usize) -> Option<&MisfitMember> {
        self.members.get(&iens)
    }

    /// Member for `iens`, created empty on first access.
    pub fn member_mut(&mut self, iens: usize) -> &mut MisfitMember {
        let history_length = self.history_length;
        self.members
            .entry(iens)
            .or_insert_with(|| MisfitMember::new(iens, history_length))
    }

    /// Members in ascending realization order.
    pub fn members(&self) -> impl Iterator<Item = &MisfitMember> {
        self.members.values()
    }

    /// Add a fully built member, returning the one it replaces (if any).
    ///
    /// # Panics
    /// Panics if the member's history length differs from the ensemble's.
    pub fn insert_member(&mut self, member: MisfitMember) -> Option<MisfitMember> {
        assert_eq!(
            member.history_length(),
            self.history_length,
            "member {} has history length {}, ensemble expects {}",
            member.iens(),
            member.history_length(),
            self.history_length
        );
        self.members.insert(member.iens(), member)
    }

    /// # Panics
    /// Panics if `step >= self.history_length()`.
    pub fn update(&mut self, iens: usize, key: &str, step: usize, value: f64) {
        self.member_mut(iens).update(key, step, value);
    }

    /// Sorted union of observation keys over all members.
    pub fn obs_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&str> = self.members.values().flat_map(|m| m.keys()).collect();
        keys.into_iter().map(str::to_string).collect()
    }

    pub fn buffer_fwrite(&self, buffer: &mut Buffer) {
        buffer.fwrite_int(ENSEMBLE_MAGIC);
        buffer.fwrite_len(self.history_length);
        buffer.fwrite_len(self.members.len());
        for member in self.members.values() {
            member.buffer_fwrite(buffer);
        }
    }

    pub fn buffer_fread_alloc(buffer: &mut Buffer) -> Result<Self, BufferError> {
        let magic = buffer.fread_int()?;
        if magic != ENSEMBLE_MAGIC {
            return Err(BufferError::BadMagic { found: magic });
        }
        let history_length = buffer.fread_len()?;
        let n_members = buffer.fread_len()?;

        let mut ensemble = Self::new(history_length);
        for _ in 0..n_members {
            let member = MisfitMember::buffer_fread_alloc(buffer)?;
            if member.history_length() != history_length {
                return Err(BufferError::LengthMismatch {
                    expected: history_length,
                    found: member.history_length(),
                });
            }
            if ensemble.members.contains_key(&member.iens()) {
                return Err(BufferError::DuplicateMember { iens: member.iens() });
            }
            ensemble.insert_member(member);
        }

        debug!(history_length, members = n_members, "misfit ensemble read");
        Ok(ensemble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_ensemble() -> MisfitEnsemble {
        let mut ens = MisfitEnsemble::new(4);
        ens.update(0, "FOPR", 1, 1.0);
        ens.update(0, "WWCT:OP1", 3, 2.0);
        ens.update(5, "FOPR", 2, 0.5);
        ens
    }

    #[test]
    fn members_are_created_on_demand() {
        let ens = small_ensemble();
        assert_eq!(ens.ens_size(), 2);
        assert!(ens.member(1).is_none());
        assert_eq!(ens.member(5).unwrap().history_length(), 4);
        assert_eq!(ens.obs_keys(), vec!["FOPR".to_string(), "WWCT:OP1".to_string()]);
    }

    #[test]
    fn ensemble_round_trip() {
        let ens = small_ensemble();
        let mut buffer = Buffer::new();
        ens.buffer_fwrite(&mut buffer);

        let back = MisfitEnsemble::buffer_fread_alloc(&mut buffer).unwrap();
        assert_eq!(back.history_length(), 4);
        assert_eq!(back.ens_size(), 2);
        for (a, b) in ens.members().zip(back.members()) {
            assert_eq!(a.iens(), b.iens());
            for key in a.keys() {
                assert_eq!(a.series(key), b.series(key));
            }
        }
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buffer = Buffer::new();
        buffer.fwrite_int(1);
        let err = MisfitEnsemble::buffer_fread_alloc(&mut buffer).unwrap_err();
        assert_eq!(err, BufferError::BadMagic { found: 1 });
    }

    #[test]
    fn repeated_realization_is_rejected() {
        let mut first = MisfitMember::new(1, 3);
        first.update("A", 1, 1.0);
        let mut second = MisfitMember::new(1, 3);
        second.update("B", 2, 2.0);

        let mut buffer = Buffer::new();
        buffer.fwrite_int(ENSEMBLE_MAGIC);
        buffer.fwrite_len(3);
        buffer.fwrite_len(2);
        first.buffer_fwrite(&mut buffer);
        second.buffer_fwrite(&mut buffer);

        let err = MisfitEnsemble::buffer_fread_alloc(&mut buffer).unwrap_err();
        assert_eq!(err, BufferError::DuplicateMember { iens: 1 });
    }
}
