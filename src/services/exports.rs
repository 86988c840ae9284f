use crate::models::proxy::ProxyUrl;

pub const DEFAULT_STRATEGY: &str = "round_robin";

/// Renders `PROXY_LIST` and `PROXY_STRATEGY` as two shell `export` lines.
/// The strategy label is passed through untouched.
pub fn format_env_exports(proxies: &[ProxyUrl], strategy: &str) -> String {
    let proxy_list = proxies
        .iter()
        .map(ProxyUrl::as_str)
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "export PROXY_LIST=\"{}\"\nexport PROXY_STRATEGY=\"{}\"",
        shell_escape(&proxy_list),
        shell_escape(strategy)
    )
}

// escapes the characters that stay special inside double quotes
fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
