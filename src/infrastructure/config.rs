use serde::Deserialize;

use crate::domain::machine::Machine;

/// Machine catalog compiled into the binary. Used whenever no
/// `config/machines.toml` overrides it, so the service runs out of the box.
const DEFAULT_MACHINES: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/machines.toml"));

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default)]
    pub machines: Vec<Machine>,
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .add_source(config::File::with_name("config/server").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_catalog_config() -> anyhow::Result<CatalogConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/machines").required(false))
        .build()?;

    let catalog: CatalogConfig = settings.try_deserialize()?;
    if catalog.machines.is_empty() {
        return default_catalog();
    }
    Ok(catalog)
}

/// Parse the embedded machine catalog.
pub fn default_catalog() -> anyhow::Result<CatalogConfig> {
    Ok(toml::from_str(DEFAULT_MACHINES)?)
}
