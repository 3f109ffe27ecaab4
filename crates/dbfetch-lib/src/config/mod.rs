mod loader;
mod model;

pub use loader::load_config;
pub use model::{Config, DownloadConfig, ResourceDef};

use crate::download::ResourceRequest;

impl Config {
    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.resources.iter().map(ResourceRequest::from).collect()
    }
}
