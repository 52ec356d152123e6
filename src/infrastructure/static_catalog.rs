// In-memory machine catalog backed by the shipped configuration
use async_trait::async_trait;

use crate::application::machine_catalog::MachineCatalog;
use crate::domain::machine::Machine;
use crate::infrastructure::config::CatalogConfig;

#[derive(Debug, Clone)]
pub struct StaticCatalog {
    machines: Vec<Machine>,
}

impl StaticCatalog {
    pub fn new(config: CatalogConfig) -> StaticCatalog {
        StaticCatalog {
            machines: config.machines,
        }
    }
}

#[async_trait]
impl MachineCatalog for StaticCatalog {
    async fn list_machines(&self) -> anyhow::Result<Vec<Machine>> {
        Ok(self.machines.clone())
    }

    async fn get_machine(&self, machine_id: &str) -> anyhow::Result<Option<Machine>> {
        Ok(self.machines.iter().find(|m| m.id == machine_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::default_catalog;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new(default_catalog().unwrap())
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let machine = catalog().get_machine("press2").await.unwrap().unwrap();
        assert_eq!(machine.name, "Hydraulic Press");
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        assert!(catalog().get_machine("reactor9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_config_order() {
        let machines = catalog().list_machines().await.unwrap();
        assert_eq!(machines.len(), 5);
        assert_eq!(machines[0].id, "cnc1");
        assert_eq!(machines[4].id, "conveyor5");
    }
}
