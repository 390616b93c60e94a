use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-valued header fields keyed by canonical name, in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Vec<String>>);

/// Canonical `Word-Word` form of a header name, e.g. `x-ipfs-pop` -> `X-Ipfs-Pop`.
pub fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

impl Headers {
    pub fn new() -> Headers {
        Headers::default()
    }

    pub fn append<K: AsRef<str>, V: Into<String>>(&mut self, name: K, value: V) {
        self.0
            .entry(canonical_name(name.as_ref()))
            .or_default()
            .push(value.into());
    }

    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(|v| v.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// One `(name, value)` pair per value, names in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Headers {
        let mut h = Headers::new();
        for (k, v) in map.iter() {
            h.append(k.as_str(), String::from_utf8_lossy(v.as_bytes()));
        }
        h
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Headers {
        let mut h = Headers::new();
        for (k, v) in iter {
            h.append(k, v);
        }
        h
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http::header::{HeaderValue, CACHE_CONTROL};

    #[test]
    fn canonicalizes_names() {
        assert_eq!(canonical_name("x-ipfs-lb-pop"), "X-Ipfs-Lb-Pop");
        assert_eq!(canonical_name("SATURN-NODE-ID"), "Saturn-Node-Id");
        assert_eq!(canonical_name("etag"), "Etag");
    }

    #[test]
    fn keeps_every_value_in_order() {
        let mut map = HeaderMap::new();
        map.append(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        map.append(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        map.append("x-proxy-cache", HeaderValue::from_static("HIT"));
        let h = Headers::from(&map);
        assert_eq!(
            h.get_all("Cache-Control").unwrap(),
            &["no-cache".to_string(), "no-store".to_string()]
        );
        assert_eq!(h.first("X-Proxy-Cache"), Some("HIT"));
        assert!(!h.contains("x-proxy-cache"));
    }

    #[test]
    fn iterates_sorted() {
        let h: Headers = vec![("b", "2"), ("a", "1"), ("b", "3")].into_iter().collect();
        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "2"), ("B", "3")]);
    }
}
