//! Remote device registry
//!
//! One host device is registered for every task a context knows about.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::cluster::{TaskEntry, TaskHandle};

/// Name of the host device every task exposes
pub const DEFAULT_HOST_DEVICE_NAME: &str = "CPU:0";

/// Compute device living on another task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDevice {
    pub name: String,
    pub task: TaskHandle,
}

impl RemoteDevice {
    /// Host device of a cluster task, e.g. `/job:worker/task:1/device:CPU:0`
    pub fn for_task(entry: &TaskEntry) -> Self {
        Self {
            name: format!("{}/device:{}", entry.task_name(), DEFAULT_HOST_DEVICE_NAME),
            task: entry.handle,
        }
    }
}

/// Devices known to a server, keyed by device name
#[derive(Default)]
pub struct DeviceManager {
    devices: RwLock<HashMap<String, RemoteDevice>>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `device` unless one with the same name exists; returns true if added
    pub fn maybe_add_device(&self, device: RemoteDevice) -> bool {
        let mut devices = self.devices.write();
        if devices.contains_key(&device.name) {
            return false;
        }
        debug!("Registered device {}", device.name);
        devices.insert(device.name.clone(), device);
        true
    }

    pub fn get_device(&self, name: &str) -> Option<RemoteDevice> {
        self.devices.read().get(name).cloned()
    }

    /// Device names in sorted order
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.devices.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}
