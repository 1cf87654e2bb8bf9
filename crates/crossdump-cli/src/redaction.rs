use serde::Serialize;

/// Connection metadata with secrets redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedConnection {
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub redacted: String,
}

/// Redact the password and secret query parameters of a connection URL.
///
/// SQLite URLs have no authority; their path is kept as the database.
pub fn redact_connection_string(conn: &str) -> RedactedConnection {
    let mut redacted = conn.to_string();
    let mut scheme = None;
    let mut user = None;
    let mut host = None;
    let mut port = None;
    let mut database = None;

    if let Some(scheme_end) = conn.find(':') {
        scheme = Some(conn[..scheme_end].to_ascii_lowercase());
    }

    if let Some(authority_start) = conn.find("://").map(|idx| idx + 3) {
        let rest = &conn[authority_start..];
        let rest = rest.split('?').next().unwrap_or("");

        if scheme.as_deref() == Some("sqlite") {
            if !rest.is_empty() {
                database = Some(rest.to_string());
            }
        } else {
            let (authority, path) = match rest.find('/') {
                Some(slash) => (&rest[..slash], &rest[slash + 1..]),
                None => (rest, ""),
            };
            let (auth, host_port) = match authority.rfind('@') {
                Some(at) => (&authority[..at], &authority[at + 1..]),
                None => ("", authority),
            };

            if let Some(colon) = auth.find(':') {
                user = Some(auth[..colon].to_string());
                let start = authority_start + colon + 1;
                let end = authority_start + auth.len();
                redacted.replace_range(start..end, "***");
            } else if !auth.is_empty() {
                user = Some(auth.to_string());
            }

            match host_port.rsplit_once(':') {
                Some((name, number)) if !number.contains(']') => {
                    host = Some(name.to_string());
                    port = number.parse().ok();
                }
                _ if !host_port.is_empty() => host = Some(host_port.to_string()),
                _ => {}
            }

            if !path.is_empty() {
                database = Some(path.to_string());
            }
        }
    } else if let Some((_, path)) = conn.split_once(':') {
        let path = path.split('?').next().unwrap_or("");
        if !path.is_empty() {
            database = Some(path.to_string());
        }
    }

    RedactedConnection {
        scheme,
        user,
        host,
        port,
        database,
        redacted: redact_query_params(&redacted),
    }
}

fn redact_query_params(conn: &str) -> String {
    let Some((base, query)) = conn.split_once('?') else {
        return conn.to_string();
    };

    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key) => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{base}?{}", params.join("&"))
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "password" | "pass" | "passwd" | "sslpassword" | "token"
    )
}
