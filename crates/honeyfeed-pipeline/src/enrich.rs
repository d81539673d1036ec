//! Enrichment stage: annotates events with the source IP's country.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use honeyfeed_core::event::{SOURCE_COUNTRY_ISOCODE, SOURCE_IP};
use honeyfeed_core::logging::{COMPONENT, ERROR_MSG, ISO_CODE, SOURCE_IP as SOURCE_IP_FIELD};
use honeyfeed_core::Event;

use crate::geoip::CountryResolver;

/// Set `source.country.isocode` on `event` when its source IP resolves.
///
/// Events without a source IP are left untouched. Malformed addresses and
/// lookup failures are logged and leave the event unannotated. Returns whether
/// the event was annotated.
pub fn enrich(resolver: &dyn CountryResolver, event: &mut Event) -> bool {
    let raw = event.get_str(SOURCE_IP);
    if raw.is_empty() {
        return false;
    }

    let ip: IpAddr = match raw.parse() {
        Ok(ip) => ip,
        Err(e) => {
            warn!(
                { COMPONENT } = "enrich",
                { SOURCE_IP_FIELD } = raw,
                { ERROR_MSG } = %e,
                "Error looking up country: malformed source IP"
            );
            return false;
        }
    };

    match resolver.lookup_country(ip) {
        Ok(Some(code)) => {
            trace!({ COMPONENT } = "enrich", %ip, { ISO_CODE } = %code, "Resolved country");
            event.set(SOURCE_COUNTRY_ISOCODE, code);
            true
        }
        Ok(None) => {
            debug!({ COMPONENT } = "enrich", %ip, "No country for source IP");
            false
        }
        Err(e) => {
            warn!(
                { COMPONENT } = "enrich",
                %ip,
                { ERROR_MSG } = %e,
                "Error looking up country"
            );
            false
        }
    }
}

/// Run the stage until the inbound channel closes or downstream goes away.
///
/// Emits exactly one event per input, in input order.
pub async fn run(
    resolver: Arc<dyn CountryResolver>,
    mut inbound: mpsc::Receiver<Event>,
    outbound: mpsc::Sender<Event>,
) {
    while let Some(mut event) = inbound.recv().await {
        enrich(resolver.as_ref(), &mut event);
        if outbound.send(event).await.is_err() {
            warn!({ COMPONENT } = "enrich", "Downstream closed, enrichment stopping");
            return;
        }
    }
    info!({ COMPONENT } = "enrich", "Inbound closed, enrichment stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use honeyfeed_core::{Error, Result};
    use std::collections::HashMap;

    struct StaticResolver(HashMap<IpAddr, String>);

    impl CountryResolver for StaticResolver {
        fn lookup_country(&self, ip: IpAddr) -> Result<Option<String>> {
            Ok(self.0.get(&ip).cloned())
        }
    }

    struct FailingResolver;

    impl CountryResolver for FailingResolver {
        fn lookup_country(&self, _ip: IpAddr) -> Result<Option<String>> {
            Err(Error::GeoIp("corrupt search tree".to_string()))
        }
    }

    fn resolver() -> StaticResolver {
        StaticResolver(HashMap::from([
            ("8.8.8.8".parse().unwrap(), "US".to_string()),
            ("2001:4860:4860::8888".parse().unwrap(), "US".to_string()),
        ]))
    }

    #[test]
    fn test_enrich_sets_country() {
        let mut event = Event::new().with(SOURCE_IP, "8.8.8.8");
        assert!(enrich(&resolver(), &mut event));
        assert_eq!(event.country_code(), "US");
    }

    #[test]
    fn test_enrich_ipv6() {
        let mut event = Event::new().with(SOURCE_IP, "2001:4860:4860::8888");
        assert!(enrich(&resolver(), &mut event));
        assert_eq!(event.country_code(), "US");
    }

    #[test]
    fn test_enrich_without_source_ip_is_untouched() {
        let original = Event::new().with("category", "alert");
        let mut event = original.clone();
        assert!(!enrich(&resolver(), &mut event));
        assert_eq!(event, original);
    }

    #[test]
    fn test_enrich_malformed_ip_passes_through() {
        let original = Event::new().with(SOURCE_IP, "not-an-ip");
        let mut event = original.clone();
        assert!(!enrich(&resolver(), &mut event));
        assert_eq!(event, original);
    }

    #[test]
    fn test_enrich_padded_ip_is_malformed() {
        for padded in [" 8.8.8.8", "8.8.8.8\n"] {
            let original = Event::new().with(SOURCE_IP, padded);
            let mut event = original.clone();
            assert!(!enrich(&resolver(), &mut event));
            assert_eq!(event, original);
        }
    }

    #[test]
    fn test_enrich_no_match_passes_through() {
        let mut event = Event::new().with(SOURCE_IP, "192.168.1.10");
        assert!(!enrich(&resolver(), &mut event));
        assert!(!event.contains(SOURCE_COUNTRY_ISOCODE));
    }

    #[test]
    fn test_enrich_lookup_error_passes_through() {
        let mut event = Event::new().with(SOURCE_IP, "8.8.8.8");
        assert!(!enrich(&FailingResolver, &mut event));
        assert!(!event.contains(SOURCE_COUNTRY_ISOCODE));
    }

    #[tokio::test]
    async fn test_run_preserves_order_and_count() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        tokio::spawn(run(Arc::new(FailingResolver), in_rx, out_tx));

        for i in 0..10 {
            in_tx
                .send(Event::new().with("seq", i).with(SOURCE_IP, "8.8.8.8"))
                .await
                .unwrap();
        }
        drop(in_tx);

        let mut seen = Vec::new();
        while let Some(event) = out_rx.recv().await {
            seen.push(event.get("seq").and_then(|v| v.as_i64()).unwrap());
        }
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }
}
