pub mod units;

pub use units::{bytes_to_mib, milliwatts_to_watts};
