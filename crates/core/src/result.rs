use serde::{Deserialize, Serialize};

/// Outcome of one sequence check. The two booleans are independent: a slice
/// can hold the expected number of rows (`count_ok`) while violating the
/// expected order (`order_ok` false). A hard count failure forces both
/// false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub order_ok: bool,
    pub count_ok: bool,
}

impl MatchResult {
    pub const PASS: MatchResult = MatchResult {
        order_ok: true,
        count_ok: true,
    };

    pub const FAIL: MatchResult = MatchResult {
        order_ok: false,
        count_ok: false,
    };

    pub fn passed(&self) -> bool {
        self.order_ok && self.count_ok
    }
}
