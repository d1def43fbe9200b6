//! Flat `key,value` property files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use super::{csv_reader, is_blank, line_of};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    file: String,
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Typed lookup; `Ok(None)` when absent, `Err` when present but unparsable.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| Error::parse(&self.file, 0, format!("property {key}: bad value '{raw}'"))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn read_properties<R: Read>(r: R, file: &str) -> Result<Properties> {
    let mut props = Properties::new(file);
    for rec in csv_reader(r).records() {
        let rec = rec?;
        if is_blank(&rec) {
            continue;
        }
        let (Some(k), Some(v)) = (rec.get(0), rec.get(1)) else {
            return Err(Error::parse(file, line_of(&rec), "expected key,value"));
        };
        props.insert(k, v);
    }
    Ok(props)
}

pub fn read_properties_path(path: &Path) -> Result<Properties> {
    read_properties(File::open(path)?, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lookup() {
        let p = read_properties("sizeS,10\nsizeT, 20\nname,x\n".as_bytes(), "properties.csv").unwrap();
        assert_eq!(p.get_parsed::<u64>("sizeT").unwrap(), Some(20));
        assert_eq!(p.get_parsed::<u64>("missing").unwrap(), None);
        assert!(p.get_parsed::<u64>("name").is_err());
    }

    #[test]
    fn single_field_line_is_rejected() {
        assert!(read_properties("sizeS\n".as_bytes(), "properties.csv").is_err());
    }
}
