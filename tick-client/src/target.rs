use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use log::warn;
use tick_core::{DEFAULT_HOST, FALLBACK_HOST};

use crate::error::ClientError;

/// Куда подключаемся: исходное имя (для логов) + все адреса резолвинга
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) label: String,
    pub(crate) addrs: Vec<SocketAddr>,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Явно заданный хост резолвим как есть. Без хоста пробуем
/// [`DEFAULT_HOST`], а если его нет в DNS - [`FALLBACK_HOST`].
pub(crate) fn resolve_target(host: Option<&str>, port: u16) -> Result<Target, ClientError> {
    match host {
        Some(h) => resolve(h, port),
        None => resolve(DEFAULT_HOST, port).or_else(|e| {
            warn!("{e}; falling back to {FALLBACK_HOST}");
            resolve(FALLBACK_HOST, port)
        }),
    }
}

fn resolve(host: &str, port: u16) -> Result<Target, ClientError> {
    // "[::1]" -> "::1": ToSocketAddrs для пары (host, port) скобок не понимает
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    let label = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    let addrs: Vec<SocketAddr> = match (host, port).to_socket_addrs() {
        Ok(it) => it.collect(),
        Err(source) => return Err(ClientError::Resolve { target: label, source }),
    };

    if addrs.is_empty() {
        return Err(ClientError::NoAddress { target: label });
    }

    Ok(Target { label, addrs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_ip_resolves_to_itself() {
        let t = resolve_target(Some("127.0.0.1"), 9000).unwrap();
        assert_eq!(t.label, "127.0.0.1:9000");
        assert_eq!(t.addrs, vec!["127.0.0.1:9000".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn ipv6_literal_gets_brackets_in_label() {
        let t = resolve_target(Some("::1"), 9000).unwrap();
        assert_eq!(t.to_string(), "[::1]:9000");
        assert_eq!(t.addrs[0].port(), 9000);
    }

    #[test]
    fn bracketed_ipv6_literal_resolves() {
        let t = resolve_target(Some("[::1]"), 9000).unwrap();
        assert_eq!(t.to_string(), "[::1]:9000");
        assert_eq!(t.addrs, vec!["[::1]:9000".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn default_host_always_yields_an_address() {
        // "server" есть только в docker-compose сети, иначе сработает fallback
        let t = resolve_target(None, 9000).unwrap();
        assert!(!t.addrs.is_empty());
        assert!(t.label == "server:9000" || t.label == "127.0.0.1:9000");
    }

    #[test]
    fn unresolvable_explicit_host_is_an_error() {
        let err = resolve_target(Some("no-such-host.invalid"), 9000).unwrap_err();
        assert!(matches!(err, ClientError::Resolve { .. } | ClientError::NoAddress { .. }));
    }
}
