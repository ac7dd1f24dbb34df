// src/parser/tables/io.rs
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use super::{
    hash::{HashConfig, Major},
    search::Checkpoint,
};
use crate::{
    error::{Error, Result},
    grammar::{Fingerprint, Grammar},
};

// -------------------- JSON (de)serialization --------------------

#[serde_as]
#[derive(Serialize, Deserialize)]
struct HashConfigDisk {
    ts: Vec<String>,
    nts: Vec<String>,
    #[serde(rename = "mod")]
    modulus: u32,
    shift: u32,
    #[serde(rename = "nt-main")]
    nt_main: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<Fingerprint>,
}

impl From<&HashConfig> for HashConfigDisk {
    fn from(c: &HashConfig) -> Self {
        Self {
            ts: c.terminals.clone(),
            nts: c.nonterminals.clone(),
            modulus: c.modulus,
            shift: c.shift,
            nt_main: c.major == Major::Nonterminal,
            fingerprint: c.fingerprint,
        }
    }
}

impl HashConfigDisk {
    fn into_config(self) -> Result<HashConfig> {
        if self.modulus == 0 {
            return Err(Error::InvalidConfig("modulus must be positive".into()));
        }
        if self.shift >= 32 {
            return Err(Error::InvalidConfig(format!(
                "shift {} does not fit a 64-bit raw hash",
                self.shift
            )));
        }
        Ok(HashConfig {
            terminals: self.ts,
            nonterminals: self.nts,
            modulus: self.modulus,
            shift: self.shift,
            major: if self.nt_main {
                Major::Nonterminal
            } else {
                Major::Terminal
            },
            fingerprint: self.fingerprint,
        })
    }
}

pub fn to_json(config: &HashConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(&HashConfigDisk::from(config))?)
}

pub fn from_json(data: &[u8]) -> Result<HashConfig> {
    serde_json::from_slice::<HashConfigDisk>(data)?.into_config()
}

/// Writes through a sibling temp file and renames, so an interrupted search
/// never leaves a truncated config behind.
pub fn save_hash_config(path: &Path, config: &HashConfig) -> Result<()> {
    let instant = Instant::now();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    {
        let f = fs::File::create(&tmp)?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, &HashConfigDisk::from(config))?;
        w.write_all(b"\n")?;
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    debug!(
        "saved hash config (mod {}) to {} in {} ms",
        config.modulus,
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

pub fn load_hash_config(path: &Path) -> Result<HashConfig> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MissingConfig(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    from_json(&data)
}

/// Fails on a fingerprint mismatch. A config without one is accepted with a
/// warning; bucket collisions remain the backstop.
pub fn check_fingerprint(grammar: &Grammar, config: &HashConfig) -> Result<()> {
    let expected = grammar.fingerprint();
    match config.fingerprint {
        Some(found) if found != expected => Err(Error::StaleConfig { expected, found }),
        Some(_) => Ok(()),
        None => {
            warn!("hash config has no grammar fingerprint; staleness is only caught by collisions");
            Ok(())
        }
    }
}

/// Loads `path` and checks it was searched for `grammar`.
pub fn load_checked(path: &Path, grammar: &Grammar) -> Result<HashConfig> {
    let config = load_hash_config(path)?;
    check_fingerprint(grammar, &config)?;
    Ok(config)
}

/// Persists each improvement to one JSON file.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
    pub writes: u64,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpoint for FileCheckpoint {
    fn persist(&mut self, config: &HashConfig) -> Result<()> {
        save_hash_config(&self.path, config)?;
        self.writes += 1;
        Ok(())
    }
}
