use crate::{error::Result, models::proxy::ProxyRecord};

#[cfg_attr(test, mockall::automock)]
pub trait ProxyClient {
    fn fetch_proxies(&self) -> Result<Vec<ProxyRecord>>;
}
