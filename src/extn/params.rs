//! `key=value;key=value` parameter maps, the wire format of every
//! get/set request that reaches the extension layer.

use std::fmt;
use std::str::FromStr;

/// Ordered string-keyed parameter map.
///
/// Keys are unique; adding an existing key replaces its value in place.
/// Query maps carry bare keys with empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrParms {
    entries: Vec<(String, String)>,
}

impl StrParms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `k1=v1;k2;k3=v3`. Empty segments are skipped.
    pub fn parse(input: &str) -> Self {
        let mut parms = Self::new();
        for segment in input.split(';') {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => parms.add_str(key, value),
                None => parms.add_str(segment, ""),
            }
        }
        parms
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get_parsed(key)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get_parsed(key)
    }

    /// `true`/`on`/`1` and `false`/`off`/`0`, case-insensitive
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get_str(key)?.trim().to_ascii_lowercase();
        match value.as_str() {
            "true" | "on" | "1" => Some(true),
            "false" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get_str(key)?.trim().parse().ok()
    }

    pub fn add_str(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn add_int(&mut self, key: &str, value: i32) {
        self.add_str(key, &value.to_string());
    }

    pub fn add_float(&mut self, key: &str, value: f32) {
        self.add_str(key, &value.to_string());
    }

    pub fn add_bool(&mut self, key: &str, value: bool) {
        self.add_str(key, if value { "true" } else { "false" });
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Move every entry of `other` into `self`
    pub fn merge(&mut self, other: StrParms) {
        for (key, value) in other.entries {
            self.add_str(&key, &value);
        }
    }
}

impl fmt::Display for StrParms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// `controller` and `stream` ids carried by display-port style requests,
/// -1 when absent or malformed.
pub fn controller_stream(parms: &StrParms) -> (i32, i32) {
    let controller = parms.get_int("controller").unwrap_or(-1);
    let stream = parms.get_int("stream").unwrap_or(-1);
    (controller, stream)
}
