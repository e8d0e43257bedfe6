//! Custom string formats referenced by the composition schemas.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

static PORTS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?:(?:([a-fA-F\d.:]+):)?(\d*)(?:-(\d+))?:)?(\d+)(?:-(\d+))?(?:/(udp|tcp))?$")
});

static EXPOSE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d+(-\d+)?(/[a-zA-Z]+)?$"));

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?:(\d+(?:\.\d+)?)h)?(?:(\d+(?:\.\d+)?)m)?(?:(\d+(?:\.\d+)?)s)?(?:(\d+(?:\.\d+)?)ms)?(?:(\d+(?:\.\d+)?)us)?(?:(\d+(?:\.\d+)?)ns)?$",
    )
});

static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d+(?:\.\d+)?$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| unreachable!("built-in format pattern is valid"))
}

/// `ports`: `[[ip:]host[-range]:]container[-range][/udp|/tcp]`.
pub fn is_port_mapping(value: &str) -> bool {
    PORTS.is_match(value)
}

/// `expose`: `port[-range][/protocol]`.
pub fn is_exposed_port(value: &str) -> bool {
    EXPOSE.is_match(value)
}

/// `duration`: `h`, `m`, `s`, `ms`, `us`, `ns` segments in that order, or a
/// bare number of milliseconds.
pub fn is_duration(value: &str) -> bool {
    !value.is_empty() && (DURATION.is_match(value) || BARE_NUMBER.is_match(value))
}

/// `subnet_ip_address`: an IPv4 or IPv6 network in CIDR notation.
pub fn is_subnet(value: &str) -> bool {
    let Some((address, prefix)) = value.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}
