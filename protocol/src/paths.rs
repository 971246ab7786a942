//! Channel paths, one per envelope kind

use serde::{Deserialize, Serialize};

/// Path carrying Request envelopes (caller → callee)
pub const REQUEST_PATH: &str = "/workflow/request";

/// Path carrying Completion envelopes (callee → caller)
pub const COMPLETION_PATH: &str = "/workflow/completion";

/// Path carrying Failure envelopes (callee → caller)
pub const FAILURE_PATH: &str = "/workflow/failure";

/// Path carrying Cancellation envelopes (caller → callee)
pub const CANCELLATION_PATH: &str = "/workflow/cancellation";

/// The four transport paths used by one caller/callee pair.
///
/// Both sides must agree on these; the defaults are the stable
/// `/workflow/*` constants above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPaths {
    pub request: String,
    pub completion: String,
    pub failure: String,
    pub cancellation: String,
}

impl ChannelPaths {
    /// Builds `<prefix>/request`, `<prefix>/completion`, ...
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self {
            request: format!("{}/request", prefix),
            completion: format!("{}/completion", prefix),
            failure: format!("{}/failure", prefix),
            cancellation: format!("{}/cancellation", prefix),
        }
    }

    /// Checks that all four paths are distinct and non-empty
    pub fn is_well_formed(&self) -> bool {
        let all = [
            &self.request,
            &self.completion,
            &self.failure,
            &self.cancellation,
        ];
        all.iter().all(|path| !path.is_empty())
            && all
                .iter()
                .enumerate()
                .all(|(i, a)| all.iter().skip(i + 1).all(|b| a != b))
    }
}

impl Default for ChannelPaths {
    fn default() -> Self {
        Self {
            request: REQUEST_PATH.to_string(),
            completion: COMPLETION_PATH.to_string(),
            failure: FAILURE_PATH.to_string(),
            cancellation: CANCELLATION_PATH.to_string(),
        }
    }
}
