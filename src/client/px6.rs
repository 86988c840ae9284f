use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    error::{FetcherError, Result},
    models::proxy::{ProxyRecord, DEFAULT_SCHEME},
    traits::ProxyClient,
};

pub const PX6_BASE_URL_API: &str = "https://px6.link/api";

const PX6_STATUS_OK: &str = "yes";
const PX6_ACTIVE: &str = "1";
const PX6_IPV6_VERSION: &str = "6";

pub struct Px6Client {
    api_client: Client,
    api_root: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Px6Scalar {
    Text(String),
    Number(i64),
}

impl Px6Scalar {
    fn as_text(&self) -> String {
        match self {
            Px6Scalar::Text(text) => text.trim().to_string(),
            Px6Scalar::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Px6Proxy {
    // id: String,
    ip: Option<String>,
    host: Option<String>,
    port: Option<Px6Scalar>,
    user: Option<String>,
    pass: Option<String>,
    #[serde(rename = "type")]
    proxy_type: Option<String>,
    version: Option<Px6Scalar>,
    // active: String,
    // country: String,
    // date_end: String,
    // descr: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Px6ProxyList {
    Array(Vec<Value>),
    Record(Map<String, Value>),
}

#[derive(Deserialize)]
struct Px6Response {
    status: String,
    error: Option<String>,
    list_count: Option<Px6Scalar>,
    list: Option<Px6ProxyList>,
}

#[derive(Deserialize)]
struct Px6ErrorBody {
    error: Option<String>,
}

impl Px6Client {
    pub fn new(api_key: String, api_root: String, timeout: Duration) -> Result<Self> {
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(FetcherError::Config("API key is empty".to_string()));
        }
        if timeout.is_zero() {
            return Err(FetcherError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let api_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| FetcherError::Network {
                message: format!("failed to build http client: {err}"),
                source: err,
            })?;

        Ok(Self {
            api_client,
            api_root: api_root.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn network_error(&self, err: reqwest::Error) -> FetcherError {
        // reqwest errors carry the request url, which embeds the api key
        let err = err.without_url();
        let message = if err.is_timeout() {
            format!(
                "request to PROXY6 timed out after {}s",
                self.timeout.as_secs_f64()
            )
        } else {
            format!("failed to request proxy list: {err}")
        };
        FetcherError::Network {
            message,
            source: err,
        }
    }
}

impl ProxyClient for Px6Client {
    fn fetch_proxies(&self) -> Result<Vec<ProxyRecord>> {
        log::debug!("fetching proxies from {}/<api-key>/getproxy", self.api_root);

        let response = self
            .api_client
            .get(format!(
                "{api_root}/{api_key}/getproxy",
                api_root = self.api_root,
                api_key = self.api_key
            ))
            .send()
            .map_err(|err| self.network_error(err))?;

        let status = response.status();
        let body = response.text().map_err(|err| self.network_error(err))?;
        log::debug!("PROXY6 answered with HTTP {status}, {} bytes", body.len());

        if !status.is_success() {
            let message = serde_json::from_str::<Px6ErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            return Err(FetcherError::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        parse_proxy_list(&body)
    }
}

fn parse_proxy_list(body: &str) -> Result<Vec<ProxyRecord>> {
    let response = serde_json::from_str::<Px6Response>(body)
        .map_err(|err| FetcherError::provider(format!("malformed payload: {err}")))?;

    if response.status != PX6_STATUS_OK {
        return Err(FetcherError::provider(
            response
                .error
                .filter(|error| !error.is_empty())
                .unwrap_or_else(|| "unknown API error".to_string()),
        ));
    }

    let list_count = response.list_count.map(|count| count.as_text());
    if list_count.as_deref() == Some("0") {
        log::info!("API returned zero active proxies");
        return Ok(Vec::new());
    }

    let entries: Vec<(String, Value)> = match response.list {
        None => return Ok(Vec::new()),
        Some(Px6ProxyList::Array(arr)) => arr
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        Some(Px6ProxyList::Record(map)) => map.into_iter().collect(),
    };

    let mut records: Vec<ProxyRecord> = Vec::new();
    for (id, value) in entries {
        if !is_active(&value) {
            log::debug!("skipping inactive proxy {id}");
            continue;
        }

        let proxy = serde_json::from_value::<Px6Proxy>(value)
            .map_err(|err| FetcherError::format(&id, format!("malformed entry: {err}")))?;
        records.push(to_record(id, proxy)?);
    }

    Ok(records)
}

// inactive entries are skipped before decoding, whatever else they carry
fn is_active(value: &Value) -> bool {
    match value.get("active") {
        Some(Value::String(active)) => active.trim() == PX6_ACTIVE,
        Some(Value::Number(active)) => active.as_i64() == Some(1),
        _ => false,
    }
}

fn to_record(id: String, proxy: Px6Proxy) -> Result<ProxyRecord> {
    let is_ipv6 = proxy.version.map(|v| v.as_text()).as_deref() == Some(PX6_IPV6_VERSION);
    let host = if is_ipv6 {
        proxy.ip
    } else {
        proxy.host.filter(|host| !host.trim().is_empty()).or(proxy.ip)
    };

    let port = match proxy.port {
        None => None,
        Some(raw) => {
            let raw = raw.as_text();
            if raw.is_empty() {
                None
            } else {
                let port = raw
                    .parse::<u16>()
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or_else(|| FetcherError::format(&id, format!("invalid port {raw:?}")))?;
                Some(port)
            }
        }
    };

    let scheme = proxy
        .proxy_type
        .map(|scheme| scheme.trim().to_string())
        .filter(|scheme| !scheme.is_empty())
        .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

    Ok(ProxyRecord {
        id,
        scheme,
        host,
        port,
        username: proxy.user.unwrap_or_default(),
        password: proxy.pass.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use mockito::Server;

    use super::*;

    fn client_for(api_root: String) -> Px6Client {
        Px6Client::new("dummy".to_string(), api_root, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn fetch_proxies_returns_only_active_entries() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/dummy/getproxy")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "status": "yes",
                    "list_count": 2,
                    "list": {
                        "11": {
                            "type": "http", "user": "active", "pass": "secret",
                            "host": "proxy.px6.net", "port": "1234",
                            "version": "4", "active": "1"
                        },
                        "12": {"active": "0"}
                    }
                }"#,
            )
            .create();

        let proxies = client_for(server.url()).fetch_proxies().unwrap();

        mock.assert();
        assert_eq!(
            proxies,
            vec![ProxyRecord {
                id: "11".to_string(),
                scheme: "http".to_string(),
                host: Some("proxy.px6.net".to_string()),
                port: Some(1234),
                username: "active".to_string(),
                password: "secret".to_string(),
            }]
        );
    }

    #[test]
    fn fetch_proxies_preserves_provider_order() {
        let body = r#"{
            "status": "yes",
            "list_count": "3",
            "list": {
                "30": {"host": "c", "port": 3, "user": "u", "pass": "p", "active": "1"},
                "10": {"host": "a", "port": 1, "user": "u", "pass": "p", "active": "1"},
                "20": {"host": "b", "port": 2, "user": "u", "pass": "p", "active": "1"}
            }
        }"#;

        let proxies = parse_proxy_list(body).unwrap();

        let hosts: Vec<_> = proxies.iter().filter_map(|p| p.host.clone()).collect();
        assert_eq!(hosts, vec!["c", "a", "b"]);
        assert!(proxies.iter().all(|p| p.scheme == "http"));
    }

    #[test]
    fn ipv6_entries_use_ip_field() {
        let body = r#"{
            "status": "yes",
            "list_count": 1,
            "list": [{
                "type": "socks", "user": "v6user", "pass": "v6pass",
                "ip": "2001:db8::1", "host": "185.1.1.1", "port": "9000",
                "version": "6", "active": "1"
            }]
        }"#;

        let proxies = parse_proxy_list(body).unwrap();

        assert_eq!(proxies.len(), 1);
        assert_eq!(proxies[0].id, "0");
        assert_eq!(proxies[0].scheme, "socks");
        assert_eq!(proxies[0].host.as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn inactive_entries_are_skipped_without_decoding() {
        let body = r#"{
            "status": "yes",
            "list_count": 4,
            "list": {
                "1": {"host": "a", "port": "1000", "user": "u", "pass": "p", "active": "1"},
                "2": {"active": "0", "user": false},
                "3": {"active": false},
                "4": {"host": "b", "port": 2000, "user": "u", "pass": "p", "active": 1}
            }
        }"#;

        let proxies = parse_proxy_list(body).unwrap();

        let ids: Vec<_> = proxies.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn active_entry_with_wrong_field_type_is_format_error() {
        let body = r#"{
            "status": "yes",
            "list_count": 1,
            "list": {"9": {"host": "a", "port": "1000", "user": false, "active": "1"}}
        }"#;

        match parse_proxy_list(body).unwrap_err() {
            FetcherError::Format { id, .. } => assert_eq!(id, "9"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn zero_list_count_yields_empty_list() {
        assert!(parse_proxy_list(r#"{"status": "yes", "list_count": 0, "list": []}"#)
            .unwrap()
            .is_empty());
        assert!(parse_proxy_list(r#"{"status": "yes", "list_count": 1, "list": {"1": {"active": "0"}}}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn api_error_status_surfaces_provider_message() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/dummy/getproxy")
            .with_status(200)
            .with_body(r#"{"status": "no", "error_id": 100, "error": "Error key"}"#)
            .create();

        let err = client_for(server.url()).fetch_proxies().unwrap_err();

        assert!(matches!(err, FetcherError::Provider { status: None, .. }));
        assert!(err.to_string().contains("Error key"));
    }

    #[test]
    fn http_error_status_is_provider_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/dummy/getproxy")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create();

        let err = client_for(server.url()).fetch_proxies().unwrap_err();

        match err {
            FetcherError::Provider { status, .. } => assert_eq!(status, Some(502)),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_provider_error() {
        let err = parse_proxy_list("not json").unwrap_err();
        assert!(matches!(err, FetcherError::Provider { .. }));

        let err = parse_proxy_list(r#"{"status": "yes", "list_count": 1, "list": "oops"}"#)
            .unwrap_err();
        assert!(matches!(err, FetcherError::Provider { .. }));
    }

    #[test]
    fn invalid_port_is_format_error() {
        let body = r#"{
            "status": "yes",
            "list_count": 1,
            "list": {"7": {"host": "a", "port": "http", "user": "u", "pass": "p", "active": "1"}}
        }"#;

        match parse_proxy_list(body).unwrap_err() {
            FetcherError::Format { id, .. } => assert_eq!(id, "7"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn missing_host_is_passed_through_for_formatting() {
        let body = r#"{
            "status": "yes",
            "list_count": 1,
            "list": {"7": {"port": "8000", "user": "u", "pass": "p", "active": "1"}}
        }"#;

        let proxies = parse_proxy_list(body).unwrap();

        assert_eq!(proxies[0].host, None);
        assert_eq!(proxies[0].port, Some(8000));
    }

    #[test]
    fn empty_api_key_is_rejected_before_any_request() {
        let err = Px6Client::new(
            "   ".to_string(),
            PX6_BASE_URL_API.to_string(),
            Duration::from_secs(30),
        )
        .err()
        .unwrap();

        assert!(matches!(err, FetcherError::Config(_)));
    }

    #[test]
    fn timeout_is_network_error() {
        // accepted by the kernel backlog, never answered
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let api_root = format!("http://{}", listener.local_addr().unwrap());
        let client =
            Px6Client::new("dummy".to_string(), api_root, Duration::from_millis(300)).unwrap();

        let err = client.fetch_proxies().unwrap_err();

        assert!(matches!(err, FetcherError::Network { .. }));
        assert!(!err.to_string().contains("dummy"));
        drop(listener);
    }
}
