//! Plain-text ledger of every username that already received a card
//!
//! The ledger is a markdown-style list kept in a single file (by default the
//! repository `README.md`):
//!
//! ```text
//! # booster
//! 1. alice
//! 2. bob
//! ```
//!
//! The first line is a free-form header and is written back verbatim. Every
//! other line that starts with a digit is an entry; the username is whatever
//! follows the last `". "` on the line. Other lines are dropped on rewrite.
//!
//! ## Ordering
//!
//! Names keep their file order, and names added during a run are appended in
//! the order they were collected. Saving renumbers every entry contiguously
//! from 1.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use booster::ledger::LedgerFile;
//!
//! let file = LedgerFile::new("README.md");
//! let mut ledger = file.load()?;
//! ledger.insert("octocat");
//! file.save(&ledger)?;
//! ```

pub mod error;
pub mod store;

pub use error::{LedgerError, Result};
pub use store::LedgerFile;

use std::collections::HashSet;

/// Header used when no ledger exists yet
pub const DEFAULT_HEADER: &str = "# booster";

/// A username together with its position in the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub ordinal: usize,
    pub username: String,
}

/// In-memory ledger: header plus unique usernames in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    header: String,
    names: Vec<String>,
    index: HashSet<String>,
    last_number: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER)
    }
}

impl Ledger {
    /// Create an empty ledger with the given header line
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            names: Vec::new(),
            index: HashSet::new(),
            last_number: 0,
        }
    }

    /// Parse ledger text
    ///
    /// Repeated names are collapsed onto their first occurrence. A file whose
    /// first line is already an entry gets the default header.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().peekable();

        let header = match lines.peek() {
            Some(first) if !is_entry(first) => {
                let header = first.to_string();
                lines.next();
                header
            }
            _ => DEFAULT_HEADER.to_string(),
        };

        let mut ledger = Self::new(header);

        for line in lines.filter(|line| is_entry(line)) {
            if let Some(number) = entry_number(line) {
                ledger.last_number = ledger.last_number.max(number);
            }
            if let Some(name) = entry_name(line) {
                ledger.insert(name);
            }
        }

        ledger
    }

    /// Render the ledger as file contents, numbering entries from 1
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + 1 + self.names.len() * 16);
        out.push_str(&self.header);
        out.push('\n');
        for record in self.records() {
            out.push_str(&format!("{}. {}\n", record.ordinal, record.username));
        }
        out
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Usernames in ledger order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Entries with the ordinals they will be saved under
    pub fn records(&self) -> impl Iterator<Item = UserRecord> + '_ {
        self.names.iter().enumerate().map(|(i, name)| UserRecord {
            ordinal: i + 1,
            username: name.clone(),
        })
    }

    pub fn contains(&self, username: &str) -> bool {
        self.index.contains(username)
    }

    /// Append a username; returns false if it is already present
    pub fn insert(&mut self, username: impl Into<String>) -> bool {
        let username = username.into();
        if !self.index.insert(username.clone()) {
            return false;
        }
        self.names.push(username);
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Highest ordinal that appeared in the parsed text (0 if none)
    pub fn last_number(&self) -> u64 {
        self.last_number
    }
}

fn is_entry(line: &str) -> bool {
    !line.trim().is_empty() && line.starts_with(|c: char| c.is_ascii_digit())
}

fn entry_number(line: &str) -> Option<u64> {
    line.split('.').next()?.trim().parse().ok()
}

fn entry_name(line: &str) -> Option<&str> {
    let name = line.rsplit(". ").next()?.trim();
    (!name.is_empty()).then_some(name)
}
