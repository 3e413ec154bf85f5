use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Internal health state reported for an output resource by health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HealthState {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
    Degraded,
    NotSupported,
    NotApplicable,
    Error,
}

impl HealthState {
    pub const ALL: [HealthState; 7] = [
        HealthState::Unknown,
        HealthState::Healthy,
        HealthState::Unhealthy,
        HealthState::Degraded,
        HealthState::NotSupported,
        HealthState::NotApplicable,
        HealthState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
            Self::Degraded => "Degraded",
            Self::NotSupported => "NotSupported",
            Self::NotApplicable => "NotApplicable",
            Self::Error => "Error",
        }
    }

    /// Translate an internal health state into the value shown to users.
    pub const fn to_user_facing(self) -> UserHealthState {
        match self {
            Self::Unknown => UserHealthState::Unhealthy,
            Self::Healthy => UserHealthState::Healthy,
            Self::Unhealthy => UserHealthState::Unhealthy,
            Self::Degraded => UserHealthState::Degraded,
            Self::NotSupported => UserHealthState::Unset,
            Self::NotApplicable => UserHealthState::Healthy,
            Self::Error => UserHealthState::Unhealthy,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| CoreError::unknown_state("health", s))
    }
}

/// Health state as surfaced in API responses.
///
/// `Unset` serializes as an empty string; it is what resources that do not
/// report health at all end up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserHealthState {
    Healthy,
    Unhealthy,
    Degraded,
    #[serde(rename = "")]
    Unset,
}

impl UserHealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
            Self::Degraded => "Degraded",
            Self::Unset => "",
        }
    }
}

impl fmt::Display for UserHealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifts a per-resource aggregate back into the internal domain so that an
/// application can aggregate over the resources it owns.
impl From<UserHealthState> for HealthState {
    fn from(state: UserHealthState) -> Self {
        match state {
            UserHealthState::Healthy => HealthState::Healthy,
            UserHealthState::Unhealthy => HealthState::Unhealthy,
            UserHealthState::Degraded => HealthState::Degraded,
            UserHealthState::Unset => HealthState::NotSupported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProvisioningState {
    #[default]
    NotProvisioned,
    Provisioning,
    Provisioned,
    Failed,
}

impl ProvisioningState {
    pub const ALL: [ProvisioningState; 4] = [
        ProvisioningState::NotProvisioned,
        ProvisioningState::Provisioning,
        ProvisioningState::Provisioned,
        ProvisioningState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotProvisioned => "NotProvisioned",
            Self::Provisioning => "Provisioning",
            Self::Provisioned => "Provisioned",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Provisioned | Self::Failed)
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvisioningState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| CoreError::unknown_state("provisioning", s))
    }
}

/// Status of one output resource backing a logical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutputResourceStatus {
    #[serde(default)]
    pub health_state: HealthState,
    #[serde(default)]
    pub provisioning_state: ProvisioningState,
}

impl OutputResourceStatus {
    pub fn new(health_state: HealthState, provisioning_state: ProvisioningState) -> Self {
        Self {
            health_state,
            provisioning_state,
        }
    }

    pub fn with_health(health_state: HealthState) -> Self {
        Self {
            health_state,
            ..Self::default()
        }
    }

    pub fn with_provisioning(provisioning_state: ProvisioningState) -> Self {
        Self {
            provisioning_state,
            ..Self::default()
        }
    }
}

/// Output resource status with the health state already translated for users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOutputResourceStatus {
    pub health_state: UserHealthState,
    pub provisioning_state: ProvisioningState,
}

impl From<&OutputResourceStatus> for UserOutputResourceStatus {
    fn from(status: &OutputResourceStatus) -> Self {
        Self {
            health_state: status.health_state.to_user_facing(),
            provisioning_state: status.provisioning_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_table_matches_user_facing_values() {
        let expected = [
            (HealthState::Unknown, UserHealthState::Unhealthy),
            (HealthState::Healthy, UserHealthState::Healthy),
            (HealthState::Unhealthy, UserHealthState::Unhealthy),
            (HealthState::Degraded, UserHealthState::Degraded),
            (HealthState::NotSupported, UserHealthState::Unset),
            (HealthState::NotApplicable, UserHealthState::Healthy),
            (HealthState::Error, UserHealthState::Unhealthy),
        ];
        for (internal, user) in expected {
            assert_eq!(internal.to_user_facing(), user, "{internal}");
        }
    }

    #[test]
    fn unset_serializes_as_empty_string() {
        let json = serde_json::to_string(&UserHealthState::Unset).unwrap();
        assert_eq!(json, "\"\"");
        let back: UserHealthState = serde_json::from_str("\"\"").unwrap();
        assert_eq!(back, UserHealthState::Unset);
    }

    #[test]
    fn output_resource_status_uses_camel_case() {
        let status = OutputResourceStatus::new(HealthState::Healthy, ProvisioningState::Failed);
        let value = serde_json::to_value(status).unwrap();
        assert_eq!(value["healthState"], "Healthy");
        assert_eq!(value["provisioningState"], "Failed");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let status: OutputResourceStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status.health_state, HealthState::Unknown);
        assert_eq!(status.provisioning_state, ProvisioningState::NotProvisioned);
    }

    #[test]
    fn states_parse_from_str() {
        assert_eq!("Degraded".parse::<HealthState>().unwrap(), HealthState::Degraded);
        assert_eq!(
            "Provisioning".parse::<ProvisioningState>().unwrap(),
            ProvisioningState::Provisioning
        );
        let err = "Sleepy".parse::<HealthState>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown health state: Sleepy");
    }

    #[test]
    fn user_state_lifts_back_to_internal() {
        assert_eq!(HealthState::from(UserHealthState::Unset), HealthState::NotSupported);
        assert_eq!(HealthState::from(UserHealthState::Degraded), HealthState::Degraded);
    }
}
