//! Wire types for applications and their async operations.

use std::collections::{HashMap, HashSet};

use armrp_api::{ErrorDetails, ValidationErrors, codes};
use armrp_core::{
    OutputResourceStatus, ProvisioningState, ResourceId, UserHealthState,
    UserOutputResourceStatus, aggregate_application_health, aggregate_application_provisioning,
    aggregate_resource_health, aggregate_resource_provisioning,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// -------------------------
// Application requests
// -------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationRequest {
    #[serde(default)]
    pub properties: ApplicationRequestProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationRequestProperties {
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
}

/// A logical resource and the output resources deployed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub output_resources: Vec<OutputResourceStatus>,
}

impl ApplicationRequest {
    /// Resource names must be present and unique within the application.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();
        for (i, resource) in self.properties.resources.iter().enumerate() {
            let field = format!("properties.resources[{i}].name");
            if resource.name.trim().is_empty() {
                errors.add(field, "must not be empty");
            } else if !seen.insert(resource.name.as_str()) {
                errors.add(field, format!("duplicates resource '{}'", resource.name));
            }
        }
        errors.into_result()
    }
}

// -------------------------
// Application views
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub properties: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    pub provisioning_state: ProvisioningState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provisioning_details: String,
    pub health_state: UserHealthState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub health_details: String,
    pub resources: Vec<ResourceStatusView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatusView {
    pub name: String,
    pub provisioning_state: ProvisioningState,
    pub health_state: UserHealthState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub health_details: String,
    pub output_resources: Vec<UserOutputResourceStatus>,
}

impl ApplicationView {
    /// Aggregate every resource, then roll the per-resource results up to the application.
    pub fn evaluate(id: &ResourceId, resources: &[ResourceDefinition]) -> Self {
        let mut rollup = HashMap::with_capacity(resources.len());
        let mut views = Vec::with_capacity(resources.len());

        for resource in resources {
            let health = aggregate_resource_health(&resource.output_resources);
            let provisioning = aggregate_resource_provisioning(&resource.output_resources);
            rollup.insert(
                resource.name.clone(),
                OutputResourceStatus::new(health.state.into(), provisioning),
            );
            views.push(ResourceStatusView {
                name: resource.name.clone(),
                provisioning_state: provisioning,
                health_state: health.state,
                health_details: health.details,
                output_resources: health.output_resources,
            });
        }

        let (health_state, health_details) = aggregate_application_health(&rollup);
        let (provisioning_state, provisioning_details) =
            aggregate_application_provisioning(&rollup);

        Self {
            id: id.to_string(),
            name: id.name().to_string(),
            resource_type: id.qualified_type(),
            properties: ApplicationStatus {
                provisioning_state,
                provisioning_details,
                health_state,
                health_details,
                resources: views,
            },
        }
    }
}

// -------------------------
// Operation statuses
// -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    Provisioning,
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn from_provisioning(state: ProvisioningState) -> Self {
        match state {
            ProvisioningState::Provisioned => Self::Succeeded,
            ProvisioningState::Failed => Self::Failed,
            ProvisioningState::NotProvisioned | ProvisioningState::Provisioning => {
                Self::Provisioning
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub id: String,
    pub name: String,
    pub status: OperationState,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

impl OperationStatus {
    /// Status of an operation that produced `view`. Terminal operations are
    /// stamped with an end time; failed ones carry the provisioning diagnostic.
    pub fn for_application(
        id: String,
        name: String,
        view: &ApplicationView,
        start_time: OffsetDateTime,
    ) -> Self {
        let provisioning_state = view.properties.provisioning_state;
        let status = OperationState::from_provisioning(provisioning_state);
        let error = (status == OperationState::Failed).then(|| {
            ErrorDetails::new(codes::INTERNAL, view.properties.provisioning_details.clone())
                .with_target(view.id.clone())
        });
        Self {
            id,
            name,
            status,
            start_time,
            end_time: provisioning_state.is_terminal().then(OffsetDateTime::now_utc),
            error,
        }
    }
}
