use std::path::Path;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use backend_domain::ports::ItemCatalog;
use backend_domain::{DomainId, ItemDefinition};

/// Item catalog loaded once from a JSON or YAML file.
pub struct FileItemCatalog {
    items: Vec<ItemDefinition>,
}

impl FileItemCatalog {
    pub fn from_entries(items: Vec<ItemDefinition>) -> Self {
        Self { items }
    }

    /// A missing file yields an empty catalog; every code then stays unresolved.
    pub async fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("item catalog {} not found, starting empty", path);
            return Ok(Self::from_entries(Vec::new()));
        }
        let content = fs::read_to_string(path).await?;
        let items = parse_catalog(path, &content)?;
        info!("loaded {} item definitions from {}", items.len(), path);
        Ok(Self::from_entries(items))
    }

    fn visible<'a>(&'a self, domain: &'a DomainId) -> impl Iterator<Item = &'a ItemDefinition> + 'a {
        self.items
            .iter()
            .filter(move |item| item.domain.as_deref().map_or(true, |scope| scope == domain.as_str()))
    }
}

fn parse_catalog(path: &str, content: &str) -> Result<Vec<ItemDefinition>> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(content)?),
        Some("json") | None => Ok(serde_json::from_str(content)?),
        Some(other) => Err(anyhow!("unsupported item catalog format '{}'", other)),
    }
}

#[async_trait]
impl ItemCatalog for FileItemCatalog {
    async fn resolve_items_by_code(
        &self,
        domain: &DomainId,
        codes: &[String],
        game_server_id: &str,
    ) -> Result<Vec<ItemDefinition>> {
        Ok(self
            .visible(domain)
            .filter(|item| item.game_server_id == game_server_id && codes.contains(&item.code))
            .cloned()
            .collect())
    }

    async fn find_items_by_ids(&self, domain: &DomainId, ids: &[String]) -> Result<Vec<ItemDefinition>> {
        Ok(self
            .visible(domain)
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }
}
