use serde::{Deserialize, Deserializer};

/// Query string or urlencoded form, keeping repeated keys such as
/// `genres=1&genres=2` in order.
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
        Ok(QueryParams { pairs })
    }
}

impl QueryParams {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        QueryParams {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, trimmed; blank counts as absent.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Trimmed value or the empty string.
    pub fn text(&self, key: &str) -> String {
        self.get_trimmed(key).unwrap_or_default().to_string()
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys() {
        let params = QueryParams::from_pairs([
            ("title", " Heat "),
            ("genres", "1"),
            ("genres", "3"),
            ("slug", ""),
        ]);
        assert_eq!(params.get("title"), Some(" Heat "));
        assert_eq!(params.text("title"), "Heat");
        assert_eq!(params.get_all("genres"), vec!["1", "3"]);
        assert!(params.has("slug"));
        assert_eq!(params.get_trimmed("slug"), None);
        assert_eq!(params.get("missing"), None);
    }
}
