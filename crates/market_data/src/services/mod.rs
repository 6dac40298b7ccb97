pub mod signal_extractor;

pub use signal_extractor::{ExtractError, SignalExtractor};
