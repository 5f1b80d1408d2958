//! Power and placement actions on a VM.

use crate::keys;
use hyperprov_transport::Method;
use hyperprov_workflow::Operation;
use serde_json::json;

pub(crate) const ACTION_PATH: &str = "/VirDomain/action";

/// Submits a single `actionType` for the workflow's VM.
pub(crate) fn vm_action(name: &str, action_type: &'static str) -> Operation {
    Operation::submit(name, Method::Post, ACTION_PATH).with_body(&[keys::VM_UUID], move |r| {
        Ok(json!([{
            "actionType": action_type,
            "virDomainUUID": r.require_str(keys::VM_UUID)?
        }]))
    })
}
