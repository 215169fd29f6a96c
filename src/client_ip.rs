use axum::http::HeaderMap;

/// Headers consulted, in order, when working out who sent a request.
const FORWARDING_HEADERS: [&str; 4] = [
    "x-real-ip",
    "cf-connecting-ip",
    "x-client-ip",
    "x-cluster-client-ip",
];

pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Resolve the originating address from proxy headers.
///
/// `X-Forwarded-For` wins (its first hop), then the single-value headers
/// above; falls back to `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            FORWARDING_HEADERS
                .iter()
                .find_map(|name| header_str(headers, name).map(str::trim).filter(|v| !v.is_empty()))
        })
        .unwrap_or(UNKNOWN_ADDRESS)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let h = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_ip(&h), "203.0.113.7");
    }

    #[test]
    fn falls_through_header_order() {
        let h = headers(&[("x-client-ip", "10.1.1.1"), ("cf-connecting-ip", "10.2.2.2")]);
        assert_eq!(client_ip(&h), "10.2.2.2");

        let h = headers(&[("x-forwarded-for", ""), ("x-cluster-client-ip", "10.3.3.3")]);
        assert_eq!(client_ip(&h), "10.3.3.3");
    }

    #[test]
    fn unknown_without_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), UNKNOWN_ADDRESS);
    }
}
