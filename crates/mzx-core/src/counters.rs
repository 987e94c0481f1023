//! Counter and string tables, kept sorted for binary-search lookup.
//!
//! Names compare case-insensitively on ASCII, matching how the game
//! resolves counter references. Both tables keep their entries sorted
//! at all times so the savegame writers can stream them in order and
//! lookups stay logarithmic.

use std::cmp::Ordering;

/// A named integer counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counter {
    /// Counter name. Raw bytes; names are not required to be UTF-8.
    pub name: Vec<u8>,
    /// Current value.
    pub value: i32,
}

/// A named string variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringVar {
    /// String name. Raw bytes.
    pub name: Vec<u8>,
    /// Current value. Raw bytes.
    pub value: Vec<u8>,
}

/// Case-insensitive ASCII name ordering used by both tables.
pub(crate) fn name_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let la = a.iter().map(|c| c.to_ascii_lowercase());
    let lb = b.iter().map(|c| c.to_ascii_lowercase());
    la.cmp(lb)
}

/// Sorted table of [`Counter`] entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterTable {
    entries: Vec<Counter>,
}

impl CounterTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counters stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no counters are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set `name` to `value`, inserting or overwriting.
    pub fn set(&mut self, name: &[u8], value: i32) {
        match self.entries.binary_search_by(|e| name_cmp(&e.name, name)) {
            Ok(i) => self.entries[i].value = value,
            Err(i) => self.entries.insert(
                i,
                Counter {
                    name: name.to_vec(),
                    value,
                },
            ),
        }
    }

    /// Look up a counter value by name.
    pub fn get(&self, name: &[u8]) -> Option<i32> {
        self.entries
            .binary_search_by(|e| name_cmp(&e.name, name))
            .ok()
            .map(|i| self.entries[i].value)
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Counter> {
        self.entries.iter()
    }
}

/// Sorted table of [`StringVar`] entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: Vec<StringVar>,
}

impl StringTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of strings stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no strings are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set `name` to `value`, inserting or overwriting.
    pub fn set(&mut self, name: &[u8], value: Vec<u8>) {
        match self.entries.binary_search_by(|e| name_cmp(&e.name, name)) {
            Ok(i) => self.entries[i].value = value,
            Err(i) => self.entries.insert(
                i,
                StringVar {
                    name: name.to_vec(),
                    value,
                },
            ),
        }
    }

    /// Look up a string value by name.
    pub fn get(&self, name: &[u8]) -> Option<&[u8]> {
        self.entries
            .binary_search_by(|e| name_cmp(&e.name, name))
            .ok()
            .map(|i| self.entries[i].value.as_slice())
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &StringVar> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut t = CounterTable::new();
        t.set(b"Score", 100);
        assert_eq!(t.get(b"score"), Some(100));
        assert_eq!(t.get(b"SCORE"), Some(100));
        assert_eq!(t.get(b"scores"), None);
    }

    #[test]
    fn set_overwrites_existing_name() {
        let mut t = CounterTable::new();
        t.set(b"gems", 1);
        t.set(b"GEMS", 2);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(b"gems"), Some(2));
    }

    #[test]
    fn strings_hold_raw_bytes() {
        let mut t = StringTable::new();
        t.set(b"$msg", vec![0xFF, 0x00, b'x']);
        assert_eq!(t.get(b"$MSG"), Some(&[0xFF, 0x00, b'x'][..]));
    }

    proptest! {
        #[test]
        fn entries_stay_sorted(names in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 1..12), 0..40))
        {
            let mut t = CounterTable::new();
            for (i, n) in names.iter().enumerate() {
                t.set(n, i as i32);
            }
            let sorted: Vec<_> = t.iter().map(|c| c.name.clone()).collect();
            for w in sorted.windows(2) {
                prop_assert_eq!(name_cmp(&w[0], &w[1]), std::cmp::Ordering::Less);
            }
            for n in &names {
                prop_assert!(t.get(n).is_some());
            }
        }
    }
}
