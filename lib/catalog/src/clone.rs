//! Clone-and-start workflow.

use crate::action::vm_action;
use crate::keys;
use crate::request::{description, tags};
use crate::template::VmTemplate;
use hyperprov_transport::Method;
use hyperprov_workflow::{DefinitionError, Operation, ResultExtractor, Workflow};
use serde_json::json;

pub const WORKFLOW_NAME: &str = "clone-vdi";

/// Builds the clone-and-start workflow.
///
/// Expects [`keys::VM_NAME`], [`keys::ASSIGNEE`], [`keys::DEPARTMENT`] and
/// [`keys::SOURCE_UUID`] in the initial context and produces
/// [`keys::VM_UUID`] for the clone.
///
/// # Errors
///
/// Returns a [`DefinitionError`] if the step list is inconsistent.
pub fn clone_vdi(template: &VmTemplate) -> Result<Workflow, DefinitionError> {
    Workflow::builder(WORKFLOW_NAME)
        .inputs(&[
            keys::VM_NAME,
            keys::ASSIGNEE,
            keys::DEPARTMENT,
            keys::SOURCE_UUID,
        ])
        .step(clone_vm(template))
        .step(vm_action("Start VM", "START"))
        .build()
}

fn clone_vm(template: &VmTemplate) -> Operation {
    let template = template.clone();
    Operation::submit("Clone VM", Method::Post, "/VirDomain/{source_uuid}/clone")
        .with_body(
            &[keys::VM_NAME, keys::ASSIGNEE, keys::DEPARTMENT],
            move |r| {
                Ok(json!({
                    "template": {
                        "name": r.require_str(keys::VM_NAME)?,
                        "description": description(r.require_str(keys::ASSIGNEE)?),
                        "operatingSystem": template.operating_system,
                        "netDevs": [{
                            "type": "VIRTIO",
                            "vlan": template.vlan
                        }],
                        "machineType": template.machine_type,
                        "cpuType": template.cpu_type,
                        "tags": tags(r.require_str(keys::DEPARTMENT)?)
                    }
                }))
            },
        )
        .with_extractor(ResultExtractor::field(keys::VM_UUID, "/createdUUID"))
}
