//! Instance handles and the object heap.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::value::Value;

/// Opaque handle to a heap instance. Identity-compared; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live object: its runtime type and field values.
#[derive(Debug, Clone)]
pub struct Instance {
    pub type_name: String,
    pub fields: HashMap<String, Value>,
}

/// Arena of live instances, handing out [`InstanceId`]s.
#[derive(Debug, Default)]
pub struct Heap {
    instances: HashMap<InstanceId, Instance>,
    next_id: u64,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, type_name: &str, fields: HashMap<String, Value>) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.insert(
            id,
            Instance {
                type_name: type_name.to_string(),
                fields,
            },
        );
        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(&id)
    }

    /// Runtime type of an instance, if it is live.
    pub fn type_of(&self, id: InstanceId) -> Option<&str> {
        self.instances.get(&id).map(|i| i.type_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
