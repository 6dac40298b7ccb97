pub mod signal_store;

pub use signal_store::{InMemorySignalStore, JsonSignalStore, SignalStore, StoreError, StoredSignals};
