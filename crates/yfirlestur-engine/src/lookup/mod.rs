//! Session-long cache for auxiliary read-only lookups (place names, person
//! thumbnails and the like).
//!
//! Answers are cached per key for the lifetime of the cache, including "not
//! found" answers. Only one request is in flight at a time: beginning a new
//! one supersedes the previous, whose answer is then dropped on arrival.
//!
//! This is host-facing API. The proofreading flow never consults it; an
//! editor that shows hover cards drives it from its own event loop and does
//! the fetching itself:
//!
//! ```rust
//! use yfirlestur_engine::{Lookup, LookupCache};
//!
//! let mut places: LookupCache<String, String> = LookupCache::new();
//!
//! // Hovering "Akureyri" starts a fetch, hovering "Hella" supersedes it
//! let Lookup::Fetch(akureyri) = places.begin("Akureyri".to_string()) else {
//!     unreachable!()
//! };
//! let Lookup::Fetch(hella) = places.begin("Hella".to_string()) else {
//!     unreachable!()
//! };
//!
//! // The late answer for Akureyri is dropped, Hella's is shown and cached
//! assert_eq!(places.complete(akureyri, Some("Norðurland".to_string())), None);
//! assert_eq!(places.complete(hella, None), None);
//! assert_eq!(places.begin("Hella".to_string()), Lookup::Cached(None));
//! ```

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Answered before; `None` means the service had nothing
    Cached(Option<V>),
    /// Caller should fetch and report back with this ticket
    Fetch(Ticket),
}

#[derive(Debug, Clone)]
pub struct LookupCache<K, V> {
    entries: HashMap<K, Option<V>>,
    in_flight: Option<(Ticket, K)>,
    next_ticket: u64,
}

impl<K, V> Default for LookupCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: None,
            next_ticket: 0,
        }
    }
}

impl<K, V> LookupCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached answer for `key`, or a ticket for fetching it
    pub fn begin(&mut self, key: K) -> Lookup<V> {
        if let Some(cached) = self.entries.get(&key) {
            return Lookup::Cached(cached.clone());
        }
        if let Some((ticket, _)) = self.in_flight.take() {
            log::debug!("Lookup {ticket:?} superseded");
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some((ticket, key));
        Lookup::Fetch(ticket)
    }

    /// Store the answer for a fetch. Returns the value to show, or `None` when
    /// the ticket was superseded or there was nothing to show.
    pub fn complete(&mut self, ticket: Ticket, value: Option<V>) -> Option<V> {
        let key = self.take_in_flight(ticket)?;
        self.entries.insert(key, value.clone());
        value
    }

    /// The fetch failed. Nothing is cached, so the next `begin` retries.
    pub fn fail(&mut self, ticket: Ticket) {
        self.take_in_flight(ticket);
    }

    pub fn get(&self, key: &K) -> Option<&Option<V>> {
        self.entries.get(key)
    }

    pub fn is_in_flight(&self, ticket: Ticket) -> bool {
        matches!(self.in_flight, Some((current, _)) if current == ticket)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take_in_flight(&mut self, ticket: Ticket) -> Option<K> {
        match self.in_flight.take() {
            Some((current, key)) if current == ticket => Some(key),
            other => {
                self.in_flight = other;
                log::debug!("Dropping answer for superseded lookup {ticket:?}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fetch(lookup: Lookup<String>) -> Ticket {
        match lookup {
            Lookup::Fetch(ticket) => ticket,
            Lookup::Cached(value) => panic!("expected a fetch, got cached {value:?}"),
        }
    }

    #[test]
    fn test_answer_is_cached_for_the_session() {
        let mut cache = LookupCache::new();
        let ticket = fetch(cache.begin("Reykjavík"));

        assert_eq!(
            cache.complete(ticket, Some("64.1°N".to_string())),
            Some("64.1°N".to_string())
        );
        assert_eq!(
            cache.begin("Reykjavík"),
            Lookup::Cached(Some("64.1°N".to_string()))
        );
    }

    #[test]
    fn test_not_found_is_cached_too() {
        let mut cache: LookupCache<&str, String> = LookupCache::new();
        let ticket = fetch(cache.begin("Atlantis"));

        assert_eq!(cache.complete(ticket, None), None);
        assert_eq!(cache.begin("Atlantis"), Lookup::Cached(None));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_new_lookup_supersedes_the_previous_one() {
        let mut cache = LookupCache::new();
        let first = fetch(cache.begin("Akureyri"));
        let second = fetch(cache.begin("Húsavík"));

        assert!(!cache.is_in_flight(first));
        assert_eq!(cache.complete(first, Some("late".to_string())), None);
        assert!(cache.get(&"Akureyri").is_none());

        assert_eq!(
            cache.complete(second, Some("66.0°N".to_string())),
            Some("66.0°N".to_string())
        );
    }

    #[test]
    fn test_failure_is_not_cached() {
        let mut cache: LookupCache<&str, String> = LookupCache::new();
        let ticket = fetch(cache.begin("Ísafjörður"));

        cache.fail(ticket);

        assert!(cache.is_empty());
        assert!(matches!(cache.begin("Ísafjörður"), Lookup::Fetch(_)));
    }
}
