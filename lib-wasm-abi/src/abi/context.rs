//! Per-call traversal state: deadline clock and recursion depth.

use std::time::{Duration, Instant};

use crate::abi::errors::{AbiError, AbiResult};

/// Hard cap on decoded array lengths.
///
/// A length prefix at or above this fails `array-size-exceeds` before any
/// element is decoded or allocated, on both the composite and the primitive
/// array paths.
pub const MAX_ARRAY_SIZE: u32 = 1 << 20;

/// Deadline and depth state threaded through one transcoding or validation
/// call. Created per call, never shared.
#[derive(Debug)]
pub struct TraverseContext {
    deadline: Instant,
    max_serialization_time: Duration,
    pub(crate) recursion_depth: u32,
}

impl TraverseContext {
    pub fn new(max_serialization_time: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(max_serialization_time)
            .unwrap_or(now + Duration::from_secs(86400));
        Self {
            deadline,
            max_serialization_time,
            recursion_depth: 0,
        }
    }

    /// Transcoder entries so far. The primary recursion defense is the
    /// field-graph check at validation time plus the deadline; hosts that
    /// want a hard ceiling on top can read this between calls.
    pub fn recursion_depth(&self) -> u32 {
        self.recursion_depth
    }

    /// Fail `abi-serialization-deadline` once the budget is exhausted.
    pub fn check_deadline(&self) -> AbiResult<()> {
        if Instant::now() >= self.deadline {
            return Err(AbiError::DeadlineExceeded {
                limit_us: self.max_serialization_time.as_micros(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_within_deadline() {
        let ctx = TraverseContext::new(Duration::from_secs(5));
        assert!(ctx.check_deadline().is_ok());
    }

    #[test]
    fn zero_budget_fails_immediately() {
        let ctx = TraverseContext::new(Duration::ZERO);
        assert!(matches!(
            ctx.check_deadline(),
            Err(AbiError::DeadlineExceeded { limit_us: 0 })
        ));
    }
}
