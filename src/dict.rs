//! Name interning cache.
//!
//! Element, attribute, entity, and notation names recur heavily inside a
//! DTD, so the parser funnels every name it scans through one dictionary
//! and hands out canonical `Rc<str>` handles. Two lookups with equal
//! content always return the same allocation, which lets the rest of the
//! engine compare names with `Rc::ptr_eq` instead of byte comparison.
//!
//! The dictionary may be shared across sequential parses; it never evicts.

use std::rc::Rc;

const MIN_DICT_SIZE: usize = 128;
const MAX_FILL_FACTOR: usize = 3;

struct XmlDictEntry {
    name: Rc<str>,
    hash: u64,
    next: Option<Box<XmlDictEntry>>,
}

/// An interning dictionary with collision-chained buckets.
#[doc(alias = "xmlDict")]
pub struct XmlDict {
    // Random seed folded into every key to keep bucket distribution
    // unpredictable across processes.
    seed: u64,
    table: Vec<Option<Box<XmlDictEntry>>>,
    nb_elems: usize,
}

impl XmlDict {
    pub fn new() -> Self {
        let mut table = Vec::new();
        table.resize_with(MIN_DICT_SIZE, || None);
        Self {
            seed: rand::random::<u32>() as u64,
            table,
            nb_elems: 0,
        }
    }

    /// Polynomial hash (base 31) over the bytes of `name`.
    fn compute_key(&self, name: &str) -> u64 {
        let mut value = self.seed;
        for &ch in name.as_bytes() {
            value = value.wrapping_mul(31).wrapping_add(ch as u64);
        }
        value ^ value.wrapping_shl(5).wrapping_add(value.wrapping_shr(3))
    }

    /// Return the canonical handle for `name`, storing a new entry if no
    /// equal entry exists yet.
    #[doc(alias = "xmlDictLookup")]
    pub fn intern(&mut self, name: &str) -> Rc<str> {
        let hash = self.compute_key(name);
        let bucket = (hash % self.table.len() as u64) as usize;

        let mut entry = self.table[bucket].as_deref();
        while let Some(e) = entry {
            if e.hash == hash && &*e.name == name {
                return Rc::clone(&e.name);
            }
            entry = e.next.as_deref();
        }

        let name: Rc<str> = Rc::from(name);
        self.table[bucket] = Some(Box::new(XmlDictEntry {
            name: Rc::clone(&name),
            hash,
            next: self.table[bucket].take(),
        }));
        self.nb_elems += 1;
        if self.nb_elems > self.table.len() * MAX_FILL_FACTOR {
            self.grow();
        }
        name
    }

    /// Check whether `name` already has a canonical entry.
    #[doc(alias = "xmlDictExists")]
    pub fn exists(&self, name: &str) -> Option<Rc<str>> {
        let hash = self.compute_key(name);
        let bucket = (hash % self.table.len() as u64) as usize;
        let mut entry = self.table[bucket].as_deref();
        while let Some(e) = entry {
            if e.hash == hash && &*e.name == name {
                return Some(Rc::clone(&e.name));
            }
            entry = e.next.as_deref();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.nb_elems
    }

    pub fn is_empty(&self) -> bool {
        self.nb_elems == 0
    }

    fn grow(&mut self) {
        let new_size = self.table.len() * 2;
        let mut new_table: Vec<Option<Box<XmlDictEntry>>> = Vec::new();
        new_table.resize_with(new_size, || None);
        for head in self.table.drain(..) {
            let mut entry = head;
            while let Some(mut e) = entry {
                entry = e.next.take();
                let bucket = (e.hash % new_size as u64) as usize;
                e.next = new_table[bucket].take();
                new_table[bucket] = Some(e);
            }
        }
        self.table = new_table;
    }
}

impl Default for XmlDict {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_identical_handles() {
        let mut dict = XmlDict::new();
        let a = dict.intern("chapter");
        let b = dict.intern("chapter");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn distinct_content_is_never_shared() {
        let mut dict = XmlDict::new();
        let a = dict.intern("title");
        let b = dict.intern("titles");
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn survives_growth() {
        let mut dict = XmlDict::new();
        let handles: Vec<_> = (0..10_000).map(|i| dict.intern(&format!("name{i}"))).collect();
        for (i, h) in handles.iter().enumerate() {
            let again = dict.intern(&format!("name{i}"));
            assert!(Rc::ptr_eq(h, &again));
        }
        assert_eq!(dict.len(), 10_000);
    }
}
