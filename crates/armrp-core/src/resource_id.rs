use std::fmt;

use crate::error::{CoreError, Result};

/// Identifier of a resource managed by the control plane.
///
/// Built from already-split components; the routing layer hands these over
/// from matched path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    plane_scope: String,
    resource_group: Option<String>,
    provider_namespace: String,
    resource_type: String,
    name: String,
}

impl ResourceId {
    pub fn new(
        plane_scope: impl Into<String>,
        provider_namespace: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let plane_scope = plane_scope.into();
        if !plane_scope.starts_with('/') || plane_scope.len() < 2 {
            return Err(CoreError::invalid_resource_id(format!(
                "plane scope '{plane_scope}' must be an absolute path"
            )));
        }
        let id = Self {
            plane_scope: plane_scope.trim_end_matches('/').to_string(),
            resource_group: None,
            provider_namespace: non_empty("provider namespace", provider_namespace.into())?,
            resource_type: non_empty("resource type", resource_type.into())?,
            name: non_empty("name", name.into())?,
        };
        Ok(id)
    }

    /// Build the `/planes/{type}/{name}` scope for a plane.
    pub fn plane_scope_for(plane_type: &str, plane_name: &str) -> String {
        format!("/planes/{plane_type}/{plane_name}")
    }

    pub fn with_resource_group(mut self, group: impl Into<String>) -> Result<Self> {
        self.resource_group = Some(non_empty("resource group", group.into())?);
        Ok(self)
    }

    /// Top-level routing prefix, e.g. `/planes/radius/local`.
    pub fn plane_scope(&self) -> &str {
        &self.plane_scope
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    pub fn provider_namespace(&self) -> &str {
        &self.provider_namespace
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Fully qualified type, e.g. `Applications.Core/applications`.
    pub fn qualified_type(&self) -> String {
        format!("{}/{}", self.provider_namespace, self.resource_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plane_scope)?;
        if let Some(group) = &self.resource_group {
            write!(f, "/resourceGroups/{group}")?;
        }
        write!(
            f,
            "/providers/{}/{}/{}",
            self.provider_namespace, self.resource_type, self.name
        )
    }
}

fn non_empty(what: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid_resource_id(format!(
            "{what} must not be empty"
        )));
    }
    Ok(value)
}
