//! Remote recipe resolution

use crate::error::{NisoError, Result};
use crate::project::RecipeSource;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info};

/// Fetches the body of a remote recipe.
#[async_trait]
pub trait RecipeFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String>;
}

pub struct HttpRecipeFetcher {
    client: Client,
}

impl HttpRecipeFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("niso/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| std::io::Error::other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecipeFetcher for HttpRecipeFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
        let url = url::Url::parse(url).map_err(|e| format!("invalid URL '{url}': {e}"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| e.to_string())?;

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(body.to_vec())
    }
}

/// Writes each recipe to `<recipes_dir>/<name>.sh`.
pub struct RecipeResolver<'a> {
    fetcher: &'a dyn RecipeFetcher,
}

impl<'a> RecipeResolver<'a> {
    pub fn new(fetcher: &'a dyn RecipeFetcher) -> Self {
        Self { fetcher }
    }

    /// With `cache_enabled`, an existing destination file is kept as is and
    /// never re-fetched. The first failing recipe aborts the rest.
    pub async fn resolve(
        &self,
        recipes: &[RecipeSource],
        recipes_dir: &Path,
        cache_enabled: bool,
    ) -> Result<()> {
        for recipe in recipes {
            let destination = recipes_dir.join(format!("{}.sh", recipe.name));

            if cache_enabled && destination.exists() {
                debug!("Using cached recipe {}", recipe.name);
                continue;
            }

            info!("Fetching recipe {} from {}", recipe.name, recipe.url);
            let body =
                self.fetcher
                    .fetch(&recipe.url)
                    .await
                    .map_err(|cause| NisoError::RecipeFetch {
                        name: recipe.name.clone(),
                        cause,
                    })?;

            std::fs::create_dir_all(recipes_dir)?;
            std::fs::write(&destination, body)?;
        }

        Ok(())
    }
}
