use super::error::EngineError;
use crate::core::models::ids::IdentityKey;
use crate::core::models::system::{ConformationalSystem, ModelError};

/// Exclusive, mutable access to a system's active conformations.
///
/// All conformation switching performed by the engine goes through a view so
/// that [`SystemView::transaction`] can put the structure back the way it found it.
pub struct SystemView<'a> {
    system: &'a mut ConformationalSystem,
}

impl<'a> SystemView<'a> {
    pub fn new(system: &'a mut ConformationalSystem) -> Self {
        Self { system }
    }

    pub fn system(&self) -> &ConformationalSystem {
        self.system
    }

    pub fn apply_move(&mut self, key: IdentityKey, conformation: usize) -> Result<(), EngineError> {
        self.system.set_active_conformation(key, conformation)?;
        Ok(())
    }

    /// Runs `action` and then restores the active conformation of every identity in `keys`,
    /// whether or not the action succeeded.
    pub fn transaction<F, R>(&mut self, keys: &[IdentityKey], action: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut Self) -> Result<R, EngineError>,
    {
        // 1. Record the original conformations.
        let originals = keys
            .iter()
            .map(|&key| {
                self.system
                    .active_conformation(key)
                    .map(|conformation| (key, conformation))
                    .ok_or(ModelError::UnknownIdentity(key))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // 2. Execute the action.
        let result = action(self);

        // 3. Put back whatever the action changed.
        for (key, conformation) in originals {
            if self.system.active_conformation(key) == Some(conformation) {
                continue;
            }
            self.system
                .set_active_conformation(key, conformation)
                .map_err(|e| EngineError::InconsistentIdentityState {
                    key,
                    conformation,
                    reason: e.to_string(),
                })?;
        }

        result
    }
}
