// Machine service - Use cases for the machine list and reading cards
use std::sync::Arc;

use crate::application::error::MonitorError;
use crate::application::machine_catalog::MachineCatalog;
use crate::domain::machine::Machine;

#[derive(Clone)]
pub struct MachineService {
    catalog: Arc<dyn MachineCatalog>,
}

impl MachineService {
    pub fn new(catalog: Arc<dyn MachineCatalog>) -> MachineService {
        MachineService { catalog }
    }

    pub async fn list_machines(&self) -> Result<Vec<Machine>, MonitorError> {
        Ok(self.catalog.list_machines().await?)
    }

    pub async fn machine(&self, machine_id: &str) -> Result<Machine, MonitorError> {
        self.catalog
            .get_machine(machine_id)
            .await?
            .ok_or_else(|| MonitorError::UnknownMachine(machine_id.to_string()))
    }
}
