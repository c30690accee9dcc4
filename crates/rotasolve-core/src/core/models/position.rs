/// One candidate type at a variable position, grouping a number of conformations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    conformation_count: usize,
    active_conformation: usize,
}

impl Identity {
    pub fn new(name: &str, conformation_count: usize) -> Self {
        Self {
            name: name.to_string(),
            conformation_count,
            active_conformation: 0,
        }
    }

    #[inline]
    pub fn conformation_count(&self) -> usize {
        self.conformation_count
    }

    #[inline]
    pub fn active_conformation(&self) -> usize {
        self.active_conformation
    }

    pub(crate) fn set_active_conformation(&mut self, conformation: usize) {
        self.active_conformation = conformation;
    }
}

/// A combinatorial slot offering several identities, each with its own rotamers.
///
/// The flat rotamer space of a position is the concatenation of the rotamers of
/// its identities, in identity order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePosition {
    pub label: String,
    identities: Vec<Identity>,
}

impl VariablePosition {
    pub fn new(label: &str, identities: Vec<Identity>) -> Self {
        Self {
            label: label.to_string(),
            identities,
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn identity(&self, index: usize) -> Option<&Identity> {
        self.identities.get(index)
    }

    pub(crate) fn identity_mut(&mut self, index: usize) -> Option<&mut Identity> {
        self.identities.get_mut(index)
    }

    /// Total number of rotamers across all identities.
    pub fn total_rotamers(&self) -> usize {
        self.identities.iter().map(Identity::conformation_count).sum()
    }

    /// Maps a flat rotamer index to `(identity, conformation)`.
    pub fn locate(&self, flat_index: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (identity_idx, identity) in self.identities.iter().enumerate() {
            let count = identity.conformation_count();
            if flat_index < offset + count {
                return Some((identity_idx, flat_index - offset));
            }
            offset += count;
        }
        None
    }

    /// Maps `(identity, conformation)` to the flat rotamer index.
    pub fn flat_index(&self, identity: usize, conformation: usize) -> Option<usize> {
        let target = self.identities.get(identity)?;
        if conformation >= target.conformation_count() {
            return None;
        }
        let offset: usize = self.identities[..identity]
            .iter()
            .map(Identity::conformation_count)
            .sum();
        Some(offset + conformation)
    }
}
