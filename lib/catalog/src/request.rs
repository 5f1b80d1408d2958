//! Per-VM provisioning inputs.

use crate::error::RequestError;
use crate::keys;
use hyperprov_core::EntityUuid;
use hyperprov_workflow::ExtractedResult;

/// What to provision and for whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    vm_name: String,
    assignee: String,
    department: String,
}

impl ProvisionRequest {
    /// Validates and creates a request. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or department is empty, or the department
    /// contains `,` (the cluster's tag separator). The assignee may be empty.
    pub fn new(
        vm_name: impl Into<String>,
        assignee: impl Into<String>,
        department: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let vm_name = vm_name.into().trim().to_string();
        let assignee = assignee.into().trim().to_string();
        let department = department.into().trim().to_string();

        if vm_name.is_empty() {
            return Err(RequestError::EmptyField { field: "vm name" });
        }
        if department.is_empty() {
            return Err(RequestError::EmptyField {
                field: "department",
            });
        }
        if department.contains(',') {
            return Err(RequestError::InvalidDepartment { department });
        }

        Ok(Self {
            vm_name,
            assignee,
            department,
        })
    }

    #[must_use]
    pub fn vm_name(&self) -> &str {
        &self.vm_name
    }

    #[must_use]
    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    #[must_use]
    pub fn department(&self) -> &str {
        &self.department
    }

    /// Initial context for [`crate::create_vdi`].
    #[must_use]
    pub fn context(&self) -> ExtractedResult {
        ExtractedResult::new()
            .with(keys::VM_NAME, self.vm_name.as_str())
            .with(keys::ASSIGNEE, self.assignee.as_str())
            .with(keys::DEPARTMENT, self.department.as_str())
    }

    /// Initial context for [`crate::clone_vdi`].
    #[must_use]
    pub fn clone_context(&self, source: &EntityUuid) -> ExtractedResult {
        self.context().with(keys::SOURCE_UUID, source.as_str())
    }
}

/// VM description naming its user.
pub(crate) fn description(assignee: &str) -> String {
    format!("Assigned to: {assignee}")
}

/// Cluster tag list for a department.
pub(crate) fn tags(department: &str) -> String {
    ["VDI", department].join(",")
}
