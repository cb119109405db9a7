mod ephemeral;
mod reaper;

pub use ephemeral::{EphemeralStore, StoreError};
pub use reaper::StoreReaper;

#[cfg(test)]
pub use ephemeral::testing;
