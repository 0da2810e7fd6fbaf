//! Process handle table for every configured engine instance.

use std::collections::HashMap;

use tracing::info;

use crate::descriptor::EngineDescriptor;
use crate::engine::{self, EngineHandle};
use crate::error::EngineError;

#[derive(Default)]
pub struct EngineTable {
    handles: HashMap<u32, EngineHandle>,
}

impl EngineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_all(descriptors: &[EngineDescriptor]) -> Result<(), EngineError> {
        for descriptor in descriptors {
            engine::build(descriptor)?;
        }
        Ok(())
    }

    pub async fn start_all(&mut self, descriptors: Vec<EngineDescriptor>) -> Result<(), EngineError> {
        for descriptor in descriptors {
            let instance = descriptor.instance;
            let handle = engine::start(descriptor).await?;
            self.handles.insert(instance, handle);
        }
        Ok(())
    }

    pub async fn stop_all(&mut self) -> Result<(), EngineError> {
        for (instance, handle) in self.handles.drain() {
            engine::stop(handle).await?;
            info!(instance, "engine stopped");
        }
        Ok(())
    }

    pub fn is_running(&self, instance: u32) -> bool {
        self.handles.contains_key(&instance)
    }

    pub fn instances(&self) -> impl Iterator<Item = u32> + '_ {
        self.handles.keys().copied()
    }
}
