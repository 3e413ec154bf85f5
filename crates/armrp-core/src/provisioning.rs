use std::collections::HashMap;

use crate::health::sorted_by_name;
use crate::status::{OutputResourceStatus, ProvisioningState};

/// Compute the provisioning state of a logical resource from its output resources.
///
/// The first `Failed` entry wins outright; any entry that is not yet
/// provisioned makes the aggregate `Provisioning`.
pub fn aggregate_resource_provisioning(statuses: &[OutputResourceStatus]) -> ProvisioningState {
    let mut state = ProvisioningState::Provisioned;
    for status in statuses {
        match status.provisioning_state {
            ProvisioningState::Failed => {
                state = ProvisioningState::Failed;
                break;
            }
            ProvisioningState::Provisioning | ProvisioningState::NotProvisioned => {
                state = ProvisioningState::Provisioning;
            }
            ProvisioningState::Provisioned => {}
        }
    }
    state
}

/// Compute the provisioning state of an application from the statuses of its
/// resources, keyed by resource name, together with a diagnostic naming the
/// resource that determined the result.
pub fn aggregate_application_provisioning(
    statuses: &HashMap<String, OutputResourceStatus>,
) -> (ProvisioningState, String) {
    let mut state = ProvisioningState::Provisioned;
    let mut details = String::new();

    for (name, status) in sorted_by_name(statuses) {
        match status.provisioning_state {
            ProvisioningState::Failed => {
                state = ProvisioningState::Failed;
                details = format!("Resource {name} is in Failed state");
                break;
            }
            pending @ (ProvisioningState::Provisioning | ProvisioningState::NotProvisioned) => {
                state = ProvisioningState::Provisioning;
                details = format!("Resource {name} is in {pending} state");
            }
            ProvisioningState::Provisioned => {}
        }
    }

    tracing::debug!(provisioning_state = %state, details = %details, "aggregated application provisioning");
    (state, details)
}
