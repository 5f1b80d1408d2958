//! Result keys shared by the provisioning workflows.

/// Name of the VM to provision. Input.
pub const VM_NAME: &str = "vm_name";
/// Who the VM is assigned to. Input.
pub const ASSIGNEE: &str = "assignee";
/// Department tag. Input.
pub const DEPARTMENT: &str = "department";
/// VM a clone is made from. Input to the clone workflow.
pub const SOURCE_UUID: &str = "source_uuid";

/// UUID of the created or cloned VM.
pub const VM_UUID: &str = "vm_uuid";
/// UUID of the attached boot device.
pub const BOOT_DEVICE_UUID: &str = "boot_device_uuid";
/// Every node in the cluster, in listing order.
pub const NODE_UUIDS: &str = "node_uuids";
/// Node the VM currently runs on.
pub const CURRENT_NODE: &str = "current_node";
