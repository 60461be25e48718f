//! Query-string parsing into an ordered multimap.

/// Flat HTTP query parameters. Keys keep first-seen order and repeated keys
/// accumulate their values in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw `application/x-www-form-urlencoded` query string.
    /// `key[]` and `key[3]` are folded into `key`, which is how array
    /// parameters arrive from browser clients.
    pub fn parse(raw: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
            params.push(normalize_key(&key), value.into_owned());
        }
        params
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replace every value of `key` with a single value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, vec![value.into()]));
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.all(key).first().map(String::as_str)
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-encode, repeating keys for multi-valued parameters
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.entries {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

fn normalize_key(key: &str) -> String {
    match key.find('[') {
        Some(open) if key.ends_with(']') => {
            let index = &key[open + 1..key.len() - 1];
            if index.is_empty() || index.chars().all(|c| c.is_ascii_digit()) {
                key[..open].to_string()
            } else {
                key.to_string()
            }
        }
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_array_brackets() {
        let params = QueryParams::parse("relations[]=user&relations[]=team_member.count&order[0]=name");
        assert_eq!(params.all("relations"), &["user".to_string(), "team_member.count".to_string()]);
        assert_eq!(params.first("order"), Some("name"));
    }

    #[test]
    fn keeps_first_seen_key_order() {
        let params = QueryParams::parse("b=1&a=2&b=3");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(params.all("b"), &["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn decodes_percent_and_plus() {
        let params = QueryParams::parse("?searchTerm=acme+labs&order=%7B%22id%22%3A%22name%22%7D");
        assert_eq!(params.first("searchTerm"), Some("acme labs"));
        assert_eq!(params.first("order"), Some("{\"id\":\"name\"}"));
    }

    #[test]
    fn leaves_named_brackets_alone() {
        let params = QueryParams::parse("filter[name]=x");
        assert_eq!(params.first("filter[name]"), Some("x"));
    }

    #[test]
    fn set_replaces_values() {
        let mut params = QueryParams::parse("id=a&id=b");
        params.set("id", "c");
        assert_eq!(params.all("id"), &["c".to_string()]);
    }
}
