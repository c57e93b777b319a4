//! Feature area flags.
//!
//! Optional application areas contribute their own policy catalog entries.
//! A disabled area is simply omitted from the catalog; there is no error
//! path for an unknown area.

use serde::{Deserialize, Serialize};

/// Enabled feature areas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Membership management (adds member retention policies).
    #[serde(default)]
    pub members: bool,

    /// Recruitment (adds candidature retention policies).
    #[serde(default)]
    pub recruitment: bool,
}
