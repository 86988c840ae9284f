use crate::{
    error::Result,
    models::proxy::{format_proxies, ProxyUrl},
    repo::proxy_file::ProxyFileRepo,
    traits::ProxyClient,
};

pub struct ProxyService {
    proxy_client: Box<dyn ProxyClient>,
    proxy_file: ProxyFileRepo,
}

impl ProxyService {
    pub fn new(proxy_client: Box<dyn ProxyClient>, proxy_file: ProxyFileRepo) -> Self {
        Self {
            proxy_client,
            proxy_file,
        }
    }

    /// Fetches, formats and persists the active proxy list. The output file
    /// is only touched once every record has formatted cleanly.
    pub fn run(&self) -> Result<Vec<ProxyUrl>> {
        let records = self.proxy_client.fetch_proxies()?;
        log::debug!("provider returned {} active proxies", records.len());

        let proxies = format_proxies(records)?;
        self.proxy_file.write(&proxies)?;

        if proxies.is_empty() {
            log::warn!("no active proxies returned by the API");
        }
        log::info!(
            "wrote {} proxies to {}",
            proxies.len(),
            self.proxy_file.path().display()
        );

        Ok(proxies)
    }
}
