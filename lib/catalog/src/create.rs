//! Create-and-configure workflow.
//!
//! 1. create the VM from the template
//! 2. attach the boot ISO
//! 3. start it
//! 4. list cluster nodes
//! 5. find the node it runs on (multi-node clusters only)
//! 6. live migrate it to another node (multi-node clusters only)
//! 7. stop it
//! 8. rename, resize to the configured vCPU count and tag it
//! 9. start it again

use crate::action::vm_action;
use crate::keys;
use crate::request::{description, tags};
use crate::template::VmTemplate;
use hyperprov_core::NodeUuid;
use hyperprov_transport::Method;
use hyperprov_workflow::{
    BuildError, DefinitionError, ExtractError, ExtractedResult, Guard, NodeSelector, Operation,
    ResultExtractor, Workflow,
};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

pub const WORKFLOW_NAME: &str = "create-vdi";

/// Builds the create-and-configure workflow.
///
/// Expects [`keys::VM_NAME`], [`keys::ASSIGNEE`] and [`keys::DEPARTMENT`] in
/// the initial context and produces [`keys::VM_UUID`].
///
/// # Errors
///
/// Returns a [`DefinitionError`] if the step list is inconsistent.
pub fn create_vdi(
    template: &VmTemplate,
    selector: Arc<dyn NodeSelector>,
) -> Result<Workflow, DefinitionError> {
    Workflow::builder(WORKFLOW_NAME)
        .inputs(&[keys::VM_NAME, keys::ASSIGNEE, keys::DEPARTMENT])
        .step(create_vm(template))
        .step(attach_boot_iso(template))
        .step(vm_action("Start VM", "START"))
        .step(list_nodes())
        .step_if(multi_node(), locate_vm())
        .step_if(multi_node(), live_migrate(selector))
        .step(vm_action("Stop VM", "STOP"))
        .step(update_vm(template))
        .step(vm_action("Start VM again", "START"))
        .build()
}

fn create_vm(template: &VmTemplate) -> Operation {
    let template = template.clone();
    Operation::submit("Create VM", Method::Post, "/VirDomain")
        .with_body(&[keys::VM_NAME, keys::ASSIGNEE], move |r| {
            Ok(json!({
                "dom": {
                    "name": r.require_str(keys::VM_NAME)?,
                    "description": description(r.require_str(keys::ASSIGNEE)?),
                    "operatingSystem": template.operating_system,
                    "mem": template.memory_bytes,
                    "numVCPU": template.vcpus,
                    "blockDevs": [{
                        "capacity": template.disk_capacity_bytes,
                        "type": "VIRTIO_DISK",
                        "cacheMode": "WRITETHROUGH"
                    }],
                    "netDevs": [{
                        "type": "VIRTIO",
                        "vlan": template.vlan
                    }],
                    "machineType": template.machine_type,
                    "cpuType": template.cpu_type
                },
                "options": {}
            }))
        })
        .with_extractor(ResultExtractor::field(keys::VM_UUID, "/createdUUID"))
}

fn attach_boot_iso(template: &VmTemplate) -> Operation {
    let iso = template.boot_iso.clone();
    Operation::submit("Attach boot ISO", Method::Post, "/VirDomainBlockDevice").with_body(
        &[keys::VM_UUID],
        move |r| {
            Ok(json!({
                "virDomainUUID": r.require_str(keys::VM_UUID)?,
                "capacity": iso.capacity_bytes,
                "path": iso.path,
                "slot": -1,
                "type": "IDE_CDROM",
                "cacheMode": "WRITETHROUGH"
            }))
        },
    )
}

fn list_nodes() -> Operation {
    Operation::read("List nodes", "/Node").with_extractor(ResultExtractor::custom(
        &[keys::NODE_UUIDS],
        node_uuids,
    ))
}

fn node_uuids(body: &JsonValue) -> Result<ExtractedResult, ExtractError> {
    let nodes = body.as_array().ok_or_else(|| ExtractError::InvalidField {
        pointer: String::new(),
        expected: "a node list",
    })?;
    let uuids = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            node.get("uuid")
                .and_then(JsonValue::as_str)
                .map(|uuid| JsonValue::String(uuid.to_string()))
                .ok_or_else(|| ExtractError::MissingField {
                    pointer: format!("/{i}/uuid"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExtractedResult::new().with(keys::NODE_UUIDS, uuids))
}

fn multi_node() -> Guard {
    Guard::new("cluster has more than one node", |r| {
        r.get(keys::NODE_UUIDS)
            .and_then(JsonValue::as_array)
            .is_some_and(|nodes| nodes.len() > 1)
    })
}

fn locate_vm() -> Operation {
    Operation::read("Locate VM", "/VirDomain/{vm_uuid}")
        .with_extractor(ResultExtractor::field(keys::CURRENT_NODE, "/0/nodeUUID"))
}

fn live_migrate(selector: Arc<dyn NodeSelector>) -> Operation {
    Operation::submit("Live migrate VM", Method::Post, crate::action::ACTION_PATH).with_body(
        &[keys::VM_UUID, keys::NODE_UUIDS, keys::CURRENT_NODE],
        move |r| {
            let candidates = r
                .require_array(keys::NODE_UUIDS)?
                .iter()
                .map(|node| {
                    node.as_str()
                        .map(NodeUuid::from)
                        .ok_or_else(|| BuildError::InvalidResult {
                            key: keys::NODE_UUIDS.to_string(),
                            expected: "a list of node UUIDs",
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let current = NodeUuid::from(r.require_str(keys::CURRENT_NODE)?);
            let target = selector.select(&candidates, &current)?;
            Ok(json!([{
                "actionType": "LIVEMIGRATE",
                "nodeUUID": target.as_str(),
                "virDomainUUID": r.require_str(keys::VM_UUID)?
            }]))
        },
    )
}

fn update_vm(template: &VmTemplate) -> Operation {
    let vcpus = template.configured_vcpus;
    Operation::submit("Update VM properties", Method::Patch, "/VirDomain/{vm_uuid}").with_body(
        &[keys::VM_NAME, keys::DEPARTMENT],
        move |r| {
            Ok(json!({
                "name": r.require_str(keys::VM_NAME)?,
                "numVCPU": vcpus,
                "tags": tags(r.require_str(keys::DEPARTMENT)?)
            }))
        },
    )
}
