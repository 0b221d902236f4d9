//! Processor-affinity primitives.
//!
//! A [`ProcessorMask`] names the logical processors a thread (or a queued job)
//! is eligible to run on. [`pin_current_thread`] applies a mask to the calling
//! thread on a best-effort basis: failure to pin is reported, never fatal, and
//! the thread simply keeps its default scheduling. On platforms without native
//! affinity support pinning degrades to the same reported-and-ignored path.

use std::fmt;

/// Bitmask identifying which logical processors a thread is eligible to run on.
///
/// Bit `i` selects logical processor `i`; processors beyond 64 are not
/// addressable. The default mask is [`ProcessorMask::ALL`], meaning
/// unrestricted scheduling.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessorMask(u64);

impl ProcessorMask {
    /// All processors eligible; pinning is a no-op for this mask.
    pub const ALL: Self = Self(u64::MAX);

    /// Mask selecting the single logical processor `index % 64`.
    pub fn single(index: usize) -> Self {
        Self(1u64 << (index % 64))
    }

    /// Mask from raw bits.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits of the mask.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Whether logical processor `index` is selected.
    pub fn contains(self, index: usize) -> bool {
        index < 64 && self.0 & (1u64 << index) != 0
    }

    /// Whether this mask places no restriction at all.
    pub fn is_unrestricted(self) -> bool {
        self == Self::ALL
    }
}

impl Default for ProcessorMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Debug for ProcessorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessorMask(0x{:x})", self.0)
    }
}

impl fmt::Display for ProcessorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Number of logical processors reported by the OS (at least 1).
pub fn hardware_concurrency() -> usize {
    num_cpus::get().max(1)
}

/// Why a pin request could not be applied.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PinError {
    /// The platform does not expose processor enumeration
    #[error("processor enumeration is not available on this platform")]
    Unsupported,

    /// The mask selects none of the processors the platform reports
    #[error("mask {mask} selects none of the {available} known processors")]
    NoEligibleProcessor {
        /// The requested mask
        mask: ProcessorMask,
        /// Number of processors the platform reports
        available: usize,
    },

    /// The OS refused the pin request
    #[error("OS rejected pinning to processor {processor}")]
    Rejected {
        /// The processor the pin targeted
        processor: usize,
    },
}

/// Pin the calling thread to the first processor selected by `mask`.
///
/// Returns `Ok(None)` for the unrestricted mask (nothing to do) and
/// `Ok(Some(processor))` once the thread is pinned. Callers are expected to
/// log a `PinError` and continue with default scheduling.
pub fn pin_current_thread(mask: ProcessorMask) -> std::result::Result<Option<usize>, PinError> {
    if mask.is_unrestricted() {
        return Ok(None);
    }

    let processors = match core_affinity::get_core_ids() {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Err(PinError::Unsupported),
    };
    let available = processors.len();

    let target = processors
        .into_iter()
        .find(|id| mask.contains(id.id))
        .ok_or(PinError::NoEligibleProcessor { mask, available })?;

    if core_affinity::set_for_current(target) {
        Ok(Some(target.id))
    } else {
        Err(PinError::Rejected {
            processor: target.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_single() {
        let mask = ProcessorMask::single(3);
        assert!(mask.contains(3));
        assert!(!mask.contains(2));
        assert!(!mask.is_unrestricted());
        assert_eq!(mask.bits(), 0b1000);
    }

    #[test]
    fn test_mask_single_wraps_past_64() {
        assert_eq!(ProcessorMask::single(64), ProcessorMask::single(0));
        assert_eq!(ProcessorMask::single(67), ProcessorMask::single(3));
    }

    #[test]
    fn test_default_mask_is_unrestricted() {
        let mask = ProcessorMask::default();
        assert!(mask.is_unrestricted());
        assert!(mask.contains(0));
        assert!(mask.contains(63));
        assert!(!mask.contains(64));
    }

    #[test]
    fn test_mask_display() {
        assert_eq!(ProcessorMask::single(4).to_string(), "0x10");
        assert_eq!(ProcessorMask::ALL.to_string(), "0xffffffffffffffff");
    }

    #[test]
    fn test_hardware_concurrency_reports_at_least_one() {
        assert!(hardware_concurrency() >= 1);
    }

    #[test]
    fn test_pin_unrestricted_is_noop() {
        assert!(matches!(pin_current_thread(ProcessorMask::ALL), Ok(None)));
    }

    #[test]
    fn test_pin_is_best_effort() {
        // Success depends on the host; only the non-fatal contract is asserted.
        let result = pin_current_thread(ProcessorMask::single(0));
        match result {
            Ok(Some(processor)) => assert_eq!(processor, 0),
            Ok(None) => panic!("restricted mask must not report a no-op"),
            Err(_) => {}
        }
    }
}
