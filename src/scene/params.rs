// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ordered string-keyed parameter bundles
//!
//! Renderer entities take flat `key -> value` maps. Dotted paths such as
//! `uniform_pixel_renderer.samples` create nested dictionaries.

use std::fmt::Display;

/// A single parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Value(String),
    Dict(ParamArray),
}

/// Insertion-ordered map of parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamArray {
    entries: Vec<(String, ParamValue)>,
}

impl ParamArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing key in place
    pub fn insert(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style insert at a dotted path
    pub fn insert_path(mut self, path: &str, value: impl Display) -> Self {
        self.set_path(path, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Display) {
        self.put(key.into(), ParamValue::Value(value.to_string()));
    }

    /// Set a value at a dotted path, creating intermediate dictionaries.
    ///
    /// A plain value standing where a dictionary is needed is replaced.
    pub fn set_path(&mut self, path: &str, value: impl Display) {
        match path.split_once('.') {
            None => self.set(path, value),
            Some((head, rest)) => {
                if let Some(ParamValue::Dict(dict)) = self.entry_mut(head) {
                    dict.set_path(rest, value);
                    return;
                }
                let mut dict = ParamArray::new();
                dict.set_path(rest, value);
                self.put(head.to_string(), ParamValue::Dict(dict));
            }
        }
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut ParamValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    fn put(&mut self, key: String, value: ParamValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|(k, v)| match v {
            ParamValue::Value(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn get_dict(&self, key: &str) -> Option<&ParamArray> {
        self.entries.iter().find_map(|(k, v)| match v {
            ParamValue::Dict(d) if k == key => Some(d),
            _ => None,
        })
    }

    /// Look up a value by dotted path
    pub fn get_path(&self, path: &str) -> Option<&str> {
        match path.split_once('.') {
            None => self.get(path),
            Some((head, rest)) => self.get_dict(head)?.get_path(rest),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Format three channels as an OSL colour literal, six decimals each
pub fn osl_color(rgb: [f64; 3]) -> String {
    format!("color {:.6} {:.6} {:.6}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_replace() {
        let p = ParamArray::new()
            .insert("b", 1)
            .insert("a", "x")
            .insert("b", 2.5);
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(p.get("b"), Some("2.5"));
    }

    #[test]
    fn test_nested_paths() {
        let p = ParamArray::new()
            .insert_path("uniform_pixel_renderer.samples", 25)
            .insert_path("rendering_threads", "1")
            .insert_path("uniform_pixel_renderer.force_antialiasing", true);
        assert_eq!(p.get_path("uniform_pixel_renderer.samples"), Some("25"));
        assert_eq!(p.get_path("rendering_threads"), Some("1"));
        assert_eq!(p.get_dict("uniform_pixel_renderer").map(|d| d.len()), Some(2));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_value_replaced_by_dict() {
        let p = ParamArray::new().insert("a", 1).insert_path("a.b", 2);
        assert_eq!(p.get("a"), None);
        assert_eq!(p.get_path("a.b"), Some("2"));
    }

    #[test]
    fn test_replaced_value_keeps_its_position() {
        let p = ParamArray::new()
            .insert("a", 1)
            .insert("b", 2)
            .insert_path("a.x", 3)
            .insert_path("a.y", 4);
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(p.get_dict("a").map(|d| d.len()), Some(2));
        assert_eq!(p.get_path("a.y"), Some("4"));
    }

    #[test]
    fn test_osl_color() {
        assert_eq!(osl_color([1.0, 0.0, 0.5]), "color 1.000000 0.000000 0.500000");
    }
}
