//! VM template values.
//!
//! Defaults reproduce the cluster's standard VDI workstation: Windows,
//! UEFI with TPM, 8 GiB, 2 vCPUs for installation and 4 once configured.

use hyperprov_core::EntityUuid;
use serde::{Deserialize, Serialize};

/// Boot ISO attached as a CD-ROM before first start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootIso {
    /// Storage path of the ISO on the cluster.
    pub path: String,
    pub capacity_bytes: u64,
}

impl Default for BootIso {
    fn default() -> Self {
        Self {
            path: "scribe/UUID-HERE".to_string(),
            capacity_bytes: 57_671_680,
        }
    }
}

/// Values shared by every VM the workflows provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmTemplate {
    pub operating_system: String,
    pub machine_type: String,
    pub cpu_type: String,
    pub memory_bytes: u64,
    /// vCPUs at creation.
    pub vcpus: u32,
    /// vCPUs applied when the VM is reconfigured.
    pub configured_vcpus: u32,
    pub disk_capacity_bytes: u64,
    pub vlan: u32,
    pub boot_iso: BootIso,
    /// Golden image cloned by the clone workflow.
    pub clone_source: Option<EntityUuid>,
    /// Department tags offered when none is given.
    pub departments: Vec<String>,
}

impl Default for VmTemplate {
    fn default() -> Self {
        Self {
            operating_system: "os_windows_server_2012".to_string(),
            machine_type: "scale-uefi-tpm-9.2".to_string(),
            cpu_type: "HC1150-9.2".to_string(),
            memory_bytes: 8 * 1024 * 1024 * 1024,
            vcpus: 2,
            configured_vcpus: 4,
            disk_capacity_bytes: 100 * 1024 * 1024 * 1024,
            vlan: 1,
            boot_iso: BootIso::default(),
            clone_source: None,
            departments: ["ACCT", "ADMIN", "FSR", "IT", "MPTCC"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
