use serde::{Deserialize, Serialize};

/// Identification of the configuration active on the reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigId {
    pub config_id: String,
    pub config_type: String,
}
