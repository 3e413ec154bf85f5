//! Health aggregation for logical resources and applications.
//!
//! Resource scope looks at every output resource and flags mixing of
//! supported and unsupported health reporting. Application scope stops at
//! the first resource that maps to `Unhealthy`.

use std::collections::HashMap;

use crate::status::{HealthState, OutputResourceStatus, UserHealthState, UserOutputResourceStatus};

pub const HEALTH_STATE_UNKNOWN_DETAILS: &str = "Health state unknown";
pub const HEALTH_AGGREGATION_ERROR_DETAILS: &str = "Health aggregation error";

/// Result of aggregating the health of one logical resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHealth {
    pub state: UserHealthState,
    /// Empty when there is nothing to report.
    pub details: String,
    /// Input statuses with their health translated to user-facing values, in input order.
    pub output_resources: Vec<UserOutputResourceStatus>,
}

/// Compute the user-facing health of a logical resource from its output resources.
pub fn aggregate_resource_health(statuses: &[OutputResourceStatus]) -> ResourceHealth {
    let mut state = UserHealthState::Healthy;
    let mut details = String::new();
    let mut found_not_supported = false;
    let mut found_healthy_or_unhealthy = false;

    for status in statuses {
        let user_state = status.health_state.to_user_facing();
        match status.health_state {
            HealthState::Unknown => {
                state = user_state;
                details = HEALTH_STATE_UNKNOWN_DETAILS.to_string();
            }
            HealthState::Healthy => found_healthy_or_unhealthy = true,
            HealthState::Unhealthy => {
                state = user_state;
                found_healthy_or_unhealthy = true;
            }
            HealthState::NotSupported => {
                state = user_state;
                found_not_supported = true;
            }
            HealthState::NotApplicable => {}
            HealthState::Degraded | HealthState::Error => {
                details = format!(
                    "output resource found in unexpected state: {}",
                    HealthState::Unhealthy.to_user_facing()
                );
            }
        }
    }

    if found_not_supported && found_healthy_or_unhealthy {
        state = HealthState::Error.to_user_facing();
        details = HEALTH_AGGREGATION_ERROR_DETAILS.to_string();
    }

    tracing::debug!(
        health_state = %state,
        details = %details,
        output_resources = statuses.len(),
        "aggregated resource health"
    );

    ResourceHealth {
        state,
        details,
        output_resources: statuses.iter().map(UserOutputResourceStatus::from).collect(),
    }
}

/// Compute the user-facing health of an application from the statuses of its
/// resources, keyed by resource name.
///
/// Resources are visited in name order. `NotSupported` resources do not
/// contribute.
pub fn aggregate_application_health(
    statuses: &HashMap<String, OutputResourceStatus>,
) -> (UserHealthState, String) {
    let mut state = UserHealthState::Healthy;
    let mut details = String::new();

    for (name, status) in sorted_by_name(statuses) {
        let user_state = status.health_state.to_user_facing();
        match status.health_state {
            HealthState::Unknown => {
                state = user_state;
                details = format!("Resource {name} has unknown health state");
            }
            HealthState::Healthy | HealthState::NotSupported => {}
            HealthState::Unhealthy => {
                state = user_state;
                details = format!("Resource {name} is unhealthy");
            }
            HealthState::Degraded | HealthState::Error | HealthState::NotApplicable => {
                details = format!(
                    "Resource {name} found in unexpected state: {}",
                    HealthState::Unhealthy.to_user_facing()
                );
            }
        }

        if user_state == UserHealthState::Unhealthy {
            break;
        }
    }

    tracing::debug!(health_state = %state, details = %details, "aggregated application health");
    (state, details)
}

pub(crate) fn sorted_by_name(
    statuses: &HashMap<String, OutputResourceStatus>,
) -> Vec<(&str, &OutputResourceStatus)> {
    let mut entries: Vec<_> = statuses
        .iter()
        .map(|(name, status)| (name.as_str(), status))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ProvisioningState;

    fn health(states: &[HealthState]) -> Vec<OutputResourceStatus> {
        states.iter().copied().map(OutputResourceStatus::with_health).collect()
    }

    fn app(entries: &[(&str, HealthState)]) -> HashMap<String, OutputResourceStatus> {
        entries
            .iter()
            .map(|(name, state)| (name.to_string(), OutputResourceStatus::with_health(*state)))
            .collect()
    }

    #[test]
    fn all_healthy_is_healthy() {
        let result = aggregate_resource_health(&health(&[HealthState::Healthy, HealthState::Healthy]));
        assert_eq!(result.state, UserHealthState::Healthy);
        assert_eq!(result.details, "");
    }

    #[test]
    fn empty_input_is_healthy() {
        let result = aggregate_resource_health(&[]);
        assert_eq!(result.state, UserHealthState::Healthy);
        assert!(result.details.is_empty());
        assert!(result.output_resources.is_empty());
    }

    #[test]
    fn mixing_supported_and_not_supported_is_an_error() {
        let result =
            aggregate_resource_health(&health(&[HealthState::Healthy, HealthState::NotSupported]));
        assert_eq!(result.state, UserHealthState::Unhealthy);
        assert_eq!(result.details, HEALTH_AGGREGATION_ERROR_DETAILS);

        let result =
            aggregate_resource_health(&health(&[HealthState::NotSupported, HealthState::Unhealthy]));
        assert_eq!(result.state, UserHealthState::Unhealthy);
        assert_eq!(result.details, HEALTH_AGGREGATION_ERROR_DETAILS);
    }

    #[test]
    fn only_not_supported_is_unset() {
        let result = aggregate_resource_health(&health(&[
            HealthState::NotSupported,
            HealthState::NotSupported,
        ]));
        assert_eq!(result.state, UserHealthState::Unset);
        assert_eq!(result.details, "");
    }

    #[test]
    fn unknown_sets_details() {
        let result = aggregate_resource_health(&health(&[HealthState::Healthy, HealthState::Unknown]));
        assert_eq!(result.state, UserHealthState::Unhealthy);
        assert_eq!(result.details, HEALTH_STATE_UNKNOWN_DETAILS);
    }

    #[test]
    fn resource_scope_does_not_stop_on_unhealthy() {
        // A later Unknown still overwrites the details after an Unhealthy entry.
        let result = aggregate_resource_health(&health(&[
            HealthState::Unhealthy,
            HealthState::Healthy,
            HealthState::Unknown,
        ]));
        assert_eq!(result.state, UserHealthState::Unhealthy);
        assert_eq!(result.details, HEALTH_STATE_UNKNOWN_DETAILS);
        assert_eq!(result.output_resources.len(), 3);
    }

    #[test]
    fn later_not_supported_overrides_unknown_state() {
        let result =
            aggregate_resource_health(&health(&[HealthState::Unknown, HealthState::NotSupported]));
        assert_eq!(result.state, UserHealthState::Unset);
        assert_eq!(result.details, HEALTH_STATE_UNKNOWN_DETAILS);
    }

    #[test]
    fn not_applicable_is_ignored() {
        let result = aggregate_resource_health(&health(&[
            HealthState::NotApplicable,
            HealthState::NotSupported,
        ]));
        assert_eq!(result.state, UserHealthState::Unset);
        assert_eq!(result.details, "");
    }

    #[test]
    fn unexpected_states_only_set_details() {
        let result = aggregate_resource_health(&health(&[HealthState::Healthy, HealthState::Degraded]));
        assert_eq!(result.state, UserHealthState::Healthy);
        assert_eq!(result.details, "output resource found in unexpected state: Unhealthy");

        let result = aggregate_resource_health(&health(&[HealthState::Error]));
        assert_eq!(result.state, UserHealthState::Healthy);
        assert_eq!(result.details, "output resource found in unexpected state: Unhealthy");
    }

    #[test]
    fn output_resources_are_translated_without_touching_input() {
        let input = vec![
            OutputResourceStatus::new(HealthState::Unknown, ProvisioningState::Provisioned),
            OutputResourceStatus::new(HealthState::NotApplicable, ProvisioningState::Failed),
            OutputResourceStatus::new(HealthState::Error, ProvisioningState::Provisioning),
        ];
        let snapshot = input.clone();
        let result = aggregate_resource_health(&input);

        assert_eq!(input, snapshot);
        let translated: Vec<_> = result.output_resources.iter().map(|s| s.health_state).collect();
        assert_eq!(
            translated,
            vec![
                UserHealthState::Unhealthy,
                UserHealthState::Healthy,
                UserHealthState::Unhealthy
            ]
        );
        assert_eq!(result.output_resources[1].provisioning_state, ProvisioningState::Failed);
    }

    #[test]
    fn application_unhealthy_names_resource() {
        let statuses = app(&[("a", HealthState::Unhealthy), ("b", HealthState::Healthy)]);
        let (state, details) = aggregate_application_health(&statuses);
        assert_eq!(state, UserHealthState::Unhealthy);
        assert_eq!(details, "Resource a is unhealthy");
    }

    #[test]
    fn application_scope_stops_on_first_unhealthy() {
        let statuses = app(&[
            ("a", HealthState::Healthy),
            ("b", HealthState::Unknown),
            ("c", HealthState::Unhealthy),
        ]);
        let (state, details) = aggregate_application_health(&statuses);
        assert_eq!(state, UserHealthState::Unhealthy);
        assert_eq!(details, "Resource b has unknown health state");
    }

    #[test]
    fn application_ignores_not_supported() {
        let statuses = app(&[("a", HealthState::NotSupported), ("b", HealthState::Healthy)]);
        let (state, details) = aggregate_application_health(&statuses);
        assert_eq!(state, UserHealthState::Healthy);
        assert_eq!(details, "");
    }

    #[test]
    fn application_unexpected_state_only_reports() {
        let statuses = app(&[("db", HealthState::Degraded)]);
        let (state, details) = aggregate_application_health(&statuses);
        assert_eq!(state, UserHealthState::Healthy);
        assert_eq!(details, "Resource db found in unexpected state: Unhealthy");
    }

    #[test]
    fn application_error_state_reports_and_stops() {
        let statuses = app(&[("a", HealthState::Error), ("b", HealthState::Unhealthy)]);
        let (state, details) = aggregate_application_health(&statuses);
        assert_eq!(state, UserHealthState::Healthy);
        assert_eq!(details, "Resource a found in unexpected state: Unhealthy");
    }

    #[test]
    fn application_result_is_stable_across_runs() {
        let statuses = app(&[
            ("x", HealthState::Unhealthy),
            ("y", HealthState::Unhealthy),
            ("z", HealthState::Healthy),
        ]);
        let first = aggregate_application_health(&statuses);
        for _ in 0..10 {
            assert_eq!(aggregate_application_health(&statuses.clone()), first);
        }
    }
}
