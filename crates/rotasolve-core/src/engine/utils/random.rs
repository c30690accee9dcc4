use rand::{RngCore, SeedableRng, rngs::StdRng};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

enum Handle {
    Owned(StdRng),
    Shared(Rc<RefCell<StdRng>>),
}

/// The random number source of a stochastic solver.
///
/// Ownership is fixed at construction: either the source owns its generator, or it
/// draws from a generator shared with the caller.
pub struct RandomSource {
    handle: Handle,
    seed: Option<u64>,
}

impl RandomSource {
    /// An owned generator. A seed of zero is replaced by a time-based seed, which can
    /// be read back through [`RandomSource::seed`].
    pub fn owned(seed: u64) -> Self {
        let seed = if seed == 0 { time_seed() } else { seed };
        Self {
            handle: Handle::Owned(StdRng::seed_from_u64(seed)),
            seed: Some(seed),
        }
    }

    pub fn shared(generator: Rc<RefCell<StdRng>>) -> Self {
        Self {
            handle: Handle::Shared(generator),
            seed: None,
        }
    }

    /// The seed of an owned generator; `None` for a shared one.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.handle, Handle::Shared(_))
    }
}

fn time_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    nanos | 1
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        match &mut self.handle {
            Handle::Owned(rng) => rng.next_u32(),
            Handle::Shared(rng) => rng.borrow_mut().next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match &mut self.handle {
            Handle::Owned(rng) => rng.next_u64(),
            Handle::Shared(rng) => rng.borrow_mut().next_u64(),
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        match &mut self.handle {
            Handle::Owned(rng) => rng.fill_bytes(dest),
            Handle::Shared(rng) => rng.borrow_mut().fill_bytes(dest),
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        match &mut self.handle {
            Handle::Owned(rng) => rng.try_fill_bytes(dest),
            Handle::Shared(rng) => rng.borrow_mut().try_fill_bytes(dest),
        }
    }
}
