use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::Ledger;
use super::error::{LedgerError, Result};

/// File-backed ledger location
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger, or start an empty one with the default header when
    /// the file does not exist
    pub fn load(&self) -> Result<Ledger> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let ledger = Ledger::parse(&text);
                info!(
                    path = %self.path.display(),
                    entries = ledger.len(),
                    last_number = ledger.last_number(),
                    "Loaded ledger"
                );
                Ok(ledger)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No ledger found, starting empty");
                Ok(Ledger::default())
            }
            Err(e) => Err(LedgerError::io(&self.path, e)),
        }
    }

    /// Rewrite the ledger file
    ///
    /// Contents go to a sibling temporary file first and are renamed over the
    /// target, so an interrupted write never leaves a truncated ledger.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| LedgerError::InvalidPath(self.path.clone()))?;

        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
        }

        let contents = ledger.render();
        {
            let mut file = fs::File::create(&tmp_path).map_err(|e| LedgerError::io(&tmp_path, e))?;
            file.write_all(contents.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| LedgerError::io(&tmp_path, e))?;
        }
        debug!(path = %tmp_path.display(), bytes = contents.len(), "Wrote temporary ledger");

        fs::rename(&tmp_path, &self.path).map_err(|e| LedgerError::io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            entries = ledger.len(),
            "Saved ledger"
        );
        Ok(())
    }
}
