use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use thiserror::Error;

pub const SERVER_KEY: &str = "wavefront-server";
pub const TOKEN_KEY: &str = "wavefront-token";
pub const START_TIME_KEY: &str = "start-time";

#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("error accessing properties file")]
    File(#[from] io::Error),
    #[error("properties file is not a flat JSON object of strings")]
    Format(#[from] serde_json::Error),
}

// Runs only ever write the `start-time` cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    map: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn start_time(&self) -> Option<&str> {
        self.get(START_TIME_KEY)
    }

    pub fn load(path: &Path) -> Result<Self, PropertiesError> {
        let file = File::open(path)?;
        let map: HashMap<String, String> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self { map })
    }

    // Keys are written sorted so the file diffs cleanly between runs.
    pub fn save(&self, path: &Path) -> Result<(), PropertiesError> {
        let sorted: std::collections::BTreeMap<_, _> = self.map.iter().collect();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &sorted)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl From<HashMap<String, String>> for Properties {
    fn from(map: HashMap<String, String>) -> Self {
        Self { map }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
