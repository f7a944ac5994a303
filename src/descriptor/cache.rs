//! Memoization of parsed read descriptors.

use std::{collections::HashMap, rc::Rc};

use log::trace;

use super::{DataItem, parse_read};
use crate::Error;

/// Content-addressed cache of parsed read descriptors.
///
/// Entries are keyed by the literal descriptor text and never invalidated.
/// Failed parses are not cached.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: HashMap<String, Rc<[DataItem]>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a read descriptor, reusing an earlier result for the same text.
    pub fn parse(&mut self, text: &str) -> Result<Rc<[DataItem]>, Error> {
        if let Some(items) = self.entries.get(text) {
            trace!("descriptor cache hit for `{text}`");
            return Ok(items.clone());
        }

        let items: Rc<[DataItem]> = parse_read(text)?.into();
        self.entries.insert(text.to_string(), items.clone());

        Ok(items)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::DescriptorCache;

    #[test]
    fn reuses_parsed_items() {
        let mut cache = DescriptorCache::new();

        let first = cache.parse("u8 str#4*2").unwrap();
        let second = cache.parse("u8 str#4*2").unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keyed_by_literal_text() {
        let mut cache = DescriptorCache::new();

        cache.parse("u8 u16").unwrap();
        cache.parse("u8  u16").unwrap();

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = DescriptorCache::new();

        assert!(cache.parse("u8#2").is_err());
        assert!(cache.is_empty());
    }
}
