// Catalog port for machine reference data
use async_trait::async_trait;

use crate::domain::machine::Machine;

#[async_trait]
pub trait MachineCatalog: Send + Sync {
    /// List every machine known to the plant.
    async fn list_machines(&self) -> anyhow::Result<Vec<Machine>>;

    /// Look up a single machine by id.
    async fn get_machine(&self, machine_id: &str) -> anyhow::Result<Option<Machine>>;
}
