//! Minimal INI reader: `[section]` headers, `key = value` lines, `#`/`;` comments.
//! Keys before the first section go into the global ("") section.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct IniConfig {
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {e}"))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let mut config = Self::new();
        let mut section = String::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| format!("Unterminated section at line {line_number}: {line}"))?
                    .trim();
                if name.is_empty() {
                    return Err(format!("Empty section name at line {line_number}"));
                }
                section = name.to_string();
                config.sections.entry(section.clone()).or_default();
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("Invalid syntax at line {line_number}: {line}"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("Empty key at line {line_number}: {line}"));
            }
            let value = value
                .split(['#', ';'])
                .next()
                .unwrap_or_default()
                .trim();

            config
                .sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }

        Ok(config)
    }

    pub fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section)?.get(key).cloned()
    }

    pub fn get_u16(&self, section: &str, key: &str) -> Option<u16> {
        self.get_string(section, key)?.parse().ok()
    }

    pub fn get_u64(&self, section: &str, key: &str) -> Option<u64> {
        self.get_string(section, key)?.parse().ok()
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        match self.get_string(section, key)?.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }

    /// Byte size with an optional `B`, `KB` or `MB` suffix.
    pub fn get_size(&self, section: &str, key: &str) -> Option<usize> {
        parse_size(&self.get_string(section, key)?)
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim().to_uppercase();
    let (number, multiplier) = if let Some(n) = value.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = value.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = value.strip_suffix('B') {
        (n, 1)
    } else {
        (value.as_str(), 1)
    };
    number.trim().parse::<usize>().ok()?.checked_mul(multiplier)
}
