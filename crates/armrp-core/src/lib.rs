pub mod error;
pub mod health;
pub mod provisioning;
pub mod resource_id;
pub mod status;

pub use error::{CoreError, Result};
pub use health::{ResourceHealth, aggregate_application_health, aggregate_resource_health};
pub use provisioning::{aggregate_application_provisioning, aggregate_resource_provisioning};
pub use resource_id::ResourceId;
pub use status::{
    HealthState, OutputResourceStatus, ProvisioningState, UserHealthState,
    UserOutputResourceStatus,
};
