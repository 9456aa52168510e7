//! Geographic rotation strategy: same-country, then same-continent, then a
//! configured preference list, then fall back to healthy.

use super::NoProxyAvailable;
use crate::proxy::Proxy;
use geo_intel::{country_from_ip, country_from_tld, haversine_km, Coordinate, IPRange};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Default)]
pub struct GeoContext {
    pub target_host: Option<String>,
    pub target_ip: Option<Ipv4Addr>,
    pub target_coordinate: Option<Coordinate>,
}

pub struct GeographicSelector {
    pub ip_ranges: Vec<IPRange>,
    pub preferred_countries: Vec<String>,
}

impl GeographicSelector {
    pub fn new(ip_ranges: Vec<IPRange>, preferred_countries: Vec<String>) -> Self {
        Self { ip_ranges, preferred_countries }
    }

    fn resolve_target_country(&self, ctx: &GeoContext) -> Option<String> {
        if let Some(host) = &ctx.target_host {
            if let Some(code) = country_from_tld(host) {
                return Some(code.to_string());
            }
        }
        if let Some(ip) = ctx.target_ip {
            return country_from_ip(&ip, &self.ip_ranges);
        }
        None
    }

    pub async fn select(&self, available: &[Proxy], ctx: &GeoContext) -> Result<Proxy, NoProxyAvailable> {
        if available.is_empty() {
            return Err(NoProxyAvailable::EmptyPool);
        }

        if let Some(target_country) = self.resolve_target_country(ctx) {
            if let Some(p) = available
                .iter()
                .find(|p| p.descriptor.geo.as_ref().map(|g| g.country == target_country).unwrap_or(false))
            {
                return Ok(p.clone());
            }
        }

        if !self.preferred_countries.is_empty() {
            if let Some(p) = available.iter().find(|p| {
                p.descriptor
                    .geo
                    .as_ref()
                    .map(|g| self.preferred_countries.iter().any(|c| c == &g.country))
                    .unwrap_or(false)
            }) {
                return Ok(p.clone());
            }
        }

        if let Some(target) = ctx.target_coordinate {
            let mut with_coords: Vec<&Proxy> = available
                .iter()
                .filter(|p| p.descriptor.geo.as_ref().map(|g| g.lat.is_some() && g.lon.is_some()).unwrap_or(false))
                .collect();
            if !with_coords.is_empty() {
                with_coords.sort_by(|a, b| {
                    let ga = a.descriptor.geo.as_ref().unwrap();
                    let gb = b.descriptor.geo.as_ref().unwrap();
                    let da = haversine_km(target, Coordinate { lat: ga.lat.unwrap(), lon: ga.lon.unwrap() });
                    let db = haversine_km(target, Coordinate { lat: gb.lat.unwrap(), lon: gb.lon.unwrap() });
                    da.partial_cmp(&db).unwrap()
                });
                return Ok(with_coords[0].clone());
            }
        }

        super::select_healthy(available).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{GeoLocation, ProxyDescriptor, ProxyType};

    fn proxy_in(id: &str, country: &str) -> Proxy {
        Proxy::new(ProxyDescriptor {
            id: id.to_string(),
            proxy_type: ProxyType::Http,
            host: "127.0.0.1".into(),
            port: 8080,
            username: None,
            password: None,
            weight: 1,
            geo: Some(GeoLocation { country: country.to_string(), continent: None, lat: None, lon: None, timezone: None }),
            tags: vec![],
            cost_per_request: None,
            max_concurrent: None,
        })
    }

    #[tokio::test]
    async fn prefers_same_country_as_tld() {
        let selector = GeographicSelector::new(vec![], vec![]);
        let proxies = vec![proxy_in("p1", "US"), proxy_in("p2", "DE")];
        let ctx = GeoContext { target_host: Some("shop.example.de".into()), target_ip: None, target_coordinate: None };
        let picked = selector.select(&proxies, &ctx).await.unwrap();
        assert_eq!(picked.id(), "p2");
    }

    #[tokio::test]
    async fn falls_back_to_preferred_country_list() {
        let selector = GeographicSelector::new(vec![], vec!["GB".into()]);
        let proxies = vec![proxy_in("p1", "US"), proxy_in("p2", "GB")];
        let ctx = GeoContext { target_host: Some("example.com".into()), target_ip: None, target_coordinate: None };
        let picked = selector.select(&proxies, &ctx).await.unwrap();
        assert_eq!(picked.id(), "p2");
    }
}
