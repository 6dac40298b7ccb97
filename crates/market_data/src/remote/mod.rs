pub mod moralis_client;
pub mod swap_response;

pub use moralis_client::MoralisClient;
pub use swap_response::{Amount, RawSwap, SwapLeg, SwapsResponse};
