//! Hostname/IP -> country heuristics. Deliberately not production GeoIP: a
//! small ccTLD table plus a handful of hard-coded IPv4 ranges.

use crate::models::IPRange;
use std::net::Ipv4Addr;

/// ccTLD -> ISO country code. Generic TLDs (.com, .org, .net, .io, ...) are
/// intentionally absent and fall through to the caller's next heuristic.
const TLD_TABLE: &[(&str, &str)] = &[
    ("de", "DE"),
    ("uk", "GB"),
    ("jp", "JP"),
    ("fr", "FR"),
    ("cn", "CN"),
    ("ru", "RU"),
    ("nl", "NL"),
    ("ca", "CA"),
    ("au", "AU"),
    ("br", "BR"),
    ("in", "IN"),
    ("it", "IT"),
    ("es", "ES"),
    ("se", "SE"),
    ("ch", "CH"),
];

/// Looks up the ccTLD of a hostname's last DNS label. Returns `None` for
/// generic TLDs or hosts with no recognizable label.
pub fn country_from_tld(hostname: &str) -> Option<&'static str> {
    let label = hostname.trim_end_matches('.').rsplit('.').next()?;
    TLD_TABLE
        .iter()
        .find(|(tld, _)| tld.eq_ignore_ascii_case(label))
        .map(|(_, code)| *code)
}

/// Linear scan over a hard-coded range table; not a real CIDR/GeoIP database.
pub fn country_from_ip(ip: &Ipv4Addr, ranges: &[IPRange]) -> Option<String> {
    ranges
        .iter()
        .find(|r| r.contains(ip))
        .map(|r| r.country_code.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_cctld() {
        assert_eq!(country_from_tld("shop.example.de"), Some("DE"));
        assert_eq!(country_from_tld("news.co.uk"), Some("GB"));
    }

    #[test]
    fn generic_tld_falls_through() {
        assert_eq!(country_from_tld("example.com"), None);
        assert_eq!(country_from_tld("example.io"), None);
    }

    #[test]
    fn ip_range_lookup_matches_contained_address() {
        let ranges = vec![IPRange {
            start: Ipv4Addr::new(8, 8, 8, 0),
            end: Ipv4Addr::new(8, 8, 8, 255),
            country_code: "US".into(),
            isp: "ExampleISP".into(),
        }];
        assert_eq!(country_from_ip(&Ipv4Addr::new(8, 8, 8, 8), &ranges), Some("US".into()));
        assert_eq!(country_from_ip(&Ipv4Addr::new(9, 9, 9, 9), &ranges), None);
    }
}
