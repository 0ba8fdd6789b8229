//! Pure building blocks shared by every platform: amounts, addresses,
//! chain ids and contract calldata. No I/O.

pub mod abi;
pub mod address;
pub mod chain;
pub mod units;

pub use address::{is_address, parse_address, short_address};
pub use chain::ChainId;
pub use units::{format_ether, parse_ether, Amount, UnitsError};
