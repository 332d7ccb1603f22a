//! The record model — one vault row and the ordered multiset of rows.
//!
//! A record is four cells: service, login, password, comment. Cells are byte
//! strings — UTF-8 text in normal use, but the model tolerates whatever a
//! decoder hands it. Records order by byte-wise comparison of the cells in
//! role order, and the set is a multiset: two identical rows are two rows.

use std::fmt;
use std::slice;

/// Cell role tags as they appear on the wire.
///
/// Values other than these four are reserved; decoders skip them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellRole {
    /// The service or site the credentials belong to.
    Service = 0,
    /// The account name.
    Login = 1,
    /// The secret itself.
    Password = 2,
    /// Free-form notes.
    Comment = 16,
}

impl CellRole {
    /// All roles in canonical (wire) order.
    pub const ALL: [Self; 4] = [Self::Service, Self::Login, Self::Password, Self::Comment];

    /// The context-specific tag value for this role.
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Map a wire tag back to a role. Reserved tags map to `None`.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Service),
            1 => Some(Self::Login),
            2 => Some(Self::Password),
            16 => Some(Self::Comment),
            _ => None,
        }
    }
}

/// One vault row.
///
/// Field order doubles as the comparison key: records sort by service, then
/// login, then password, then comment, byte-wise.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Record {
    /// Service cell (tag 0).
    pub service: Vec<u8>,
    /// Login cell (tag 1).
    pub login: Vec<u8>,
    /// Password cell (tag 2).
    pub password: Vec<u8>,
    /// Comment cell (tag 16).
    pub comment: Vec<u8>,
}

impl Record {
    /// Build a record from text cells.
    #[must_use]
    pub fn from_text(service: &str, login: &str, password: &str, comment: &str) -> Self {
        Self {
            service: service.as_bytes().to_vec(),
            login: login.as_bytes().to_vec(),
            password: password.as_bytes().to_vec(),
            comment: comment.as_bytes().to_vec(),
        }
    }

    /// The cell for a role.
    #[must_use]
    pub fn cell(&self, role: CellRole) -> &[u8] {
        match role {
            CellRole::Service => &self.service,
            CellRole::Login => &self.login,
            CellRole::Password => &self.password,
            CellRole::Comment => &self.comment,
        }
    }

    /// Mutable access to the cell for a role.
    pub fn cell_mut(&mut self, role: CellRole) -> &mut Vec<u8> {
        match role {
            CellRole::Service => &mut self.service,
            CellRole::Login => &mut self.login,
            CellRole::Password => &mut self.password,
            CellRole::Comment => &mut self.comment,
        }
    }

    /// `true` when every cell is empty. Empty records are never persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        CellRole::ALL.iter().all(|&role| self.cell(role).is_empty())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The password cell never reaches Debug output.
        f.debug_struct("Record")
            .field("service", &String::from_utf8_lossy(&self.service))
            .field("login", &String::from_utf8_lossy(&self.login))
            .field("password", &"***")
            .field("comment", &String::from_utf8_lossy(&self.comment))
            .finish()
    }
}

/// The in-memory vault contents: records ordered by their cell key, with
/// duplicates preserved in insertion order among equals.
#[derive(Clone, Default, Debug)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build a set from unordered records. The sort is stable, so decoded
    /// file order is preserved among equal-keyed duplicates.
    #[must_use]
    pub fn from_records(mut records: Vec<Record>) -> Self {
        records.sort();
        Self { records }
    }

    /// Insert a record at its ordered position, after any equal records.
    pub fn insert(&mut self, record: Record) {
        let at = self.records.partition_point(|existing| existing <= &record);
        self.records.insert(at, record);
    }

    /// Remove and return the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, like `Vec::remove`.
    pub fn remove(&mut self, index: usize) -> Record {
        self.records.remove(index)
    }

    /// The record at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Iterate in canonical (emission) order.
    pub fn iter(&self) -> slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Number of records, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
