//! Unit conversion utilities

/// Milliwatts per watt, as reported by NVML power queries.
pub const MILLIWATTS_PER_WATT: f64 = 1000.0;

/// Bytes per mebibyte.
pub const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Convert milliwatts to watts
#[inline]
pub fn milliwatts_to_watts(milliwatts: u32) -> f64 {
    milliwatts as f64 / MILLIWATTS_PER_WATT
}

/// Convert bytes to mebibytes
#[inline]
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milliwatts_to_watts() {
        assert_eq!(milliwatts_to_watts(150_000), 150.0);
        assert_eq!(milliwatts_to_watts(1), 0.001);
        assert_eq!(milliwatts_to_watts(0), 0.0);
    }

    #[test]
    fn test_bytes_to_mib() {
        assert_eq!(bytes_to_mib(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mib(24 * 1024 * 1024 * 1024), 24576.0);
        assert_eq!(bytes_to_mib(512 * 1024), 0.5);
        assert_eq!(bytes_to_mib(0), 0.0);
    }
}
