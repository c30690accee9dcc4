use slotmap::new_key_type;

new_key_type! {
    pub struct AtomId;
}

/// Addresses one identity (candidate type) of a variable position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub position: usize,
    pub identity: usize,
}

impl IdentityKey {
    pub fn new(position: usize, identity: usize) -> Self {
        Self { position, identity }
    }
}

/// Addresses one conformation of one identity of a variable position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RotamerKey {
    pub position: usize,
    pub identity: usize,
    pub rotamer: usize,
}

impl RotamerKey {
    pub fn new(position: usize, identity: usize, rotamer: usize) -> Self {
        Self {
            position,
            identity,
            rotamer,
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(self.position, self.identity)
    }
}

/// Canonical key for an identity pair of two distinct variable positions.
///
/// The higher position index always comes first, matching the lower-triangle
/// layout of the pair energy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub position_a: usize,
    pub identity_a: usize,
    pub position_b: usize,
    pub identity_b: usize,
}

impl PairKey {
    /// Builds the canonical key for two identities, or `None` if both share a position.
    pub fn canonical(first: IdentityKey, second: IdentityKey) -> Option<Self> {
        use std::cmp::Ordering;
        match first.position.cmp(&second.position) {
            Ordering::Equal => None,
            Ordering::Greater => Some(Self {
                position_a: first.position,
                identity_a: first.identity,
                position_b: second.position,
                identity_b: second.identity,
            }),
            Ordering::Less => Some(Self {
                position_a: second.position,
                identity_a: second.identity,
                position_b: first.position,
                identity_b: first.identity,
            }),
        }
    }
}
