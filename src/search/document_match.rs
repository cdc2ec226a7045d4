//! Search results produced by searchers.

use std::fmt;
use std::mem;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::index::IndexInternalId;
use crate::search::explanation::Explanation;

/// Path of indices locating a value inside nested/array structure.
pub type ArrayPositions = Vec<u64>;

/// A single term occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Token position. Real-valued so synonyms can sit between integral positions.
    pub pos: f64,
    /// Byte offset where the token starts.
    pub start: u64,
    /// Byte offset where the token ends.
    pub end: u64,
    /// Array path of the value holding the token.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_positions: ArrayPositions,
}

impl Location {
    /// Check whether both locations come from the same array element.
    pub fn same_array_element(&self, other: &Location) -> bool {
        self.array_positions == other.array_positions
    }

    /// Approximate heap and inline size in bytes.
    pub fn size(&self) -> usize {
        mem::size_of::<Location>() + self.array_positions.len() * mem::size_of::<u64>()
    }
}

/// Term -> ordered occurrences, scoped to one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermLocationMap(AHashMap<String, Vec<Location>>);

impl TermLocationMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an occurrence for `term`.
    pub fn add_location(&mut self, term: &str, location: Location) {
        match self.0.get_mut(term) {
            Some(locations) => locations.push(location),
            None => {
                self.0.insert(term.to_string(), vec![location]);
            }
        }
    }

    /// Occurrences of one term.
    pub fn get(&self, term: &str) -> Option<&[Location]> {
        self.0.get(term).map(|locations| locations.as_slice())
    }

    /// Iterate over terms and their occurrences.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Location>)> {
        self.0.iter()
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Move every occurrence of `other` into this map.
    pub fn merge(&mut self, other: TermLocationMap) {
        for (term, mut locations) in other.0 {
            self.0.entry(term).or_default().append(&mut locations);
        }
    }

    fn size(&self) -> usize {
        self.0
            .iter()
            .map(|(term, locations)| {
                term.len() + locations.iter().map(Location::size).sum::<usize>()
            })
            .sum()
    }
}

/// Field -> term -> occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTermLocationMap(AHashMap<String, TermLocationMap>);

impl FieldTermLocationMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an occurrence for `term` in `field`.
    pub fn add_location(&mut self, field: &str, term: &str, location: Location) {
        match self.0.get_mut(field) {
            Some(terms) => terms.add_location(term, location),
            None => {
                let mut terms = TermLocationMap::new();
                terms.add_location(term, location);
                self.0.insert(field.to_string(), terms);
            }
        }
    }

    /// Per-term occurrences of one field.
    pub fn get(&self, field: &str) -> Option<&TermLocationMap> {
        self.0.get(field)
    }

    /// Replace the occurrences of one field.
    pub fn insert(&mut self, field: String, terms: TermLocationMap) {
        self.0.insert(field, terms);
    }

    /// Names of the fields with occurrences.
    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterate over fields and their term maps.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TermLocationMap)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Move every occurrence of `other` into this map.
    pub fn merge(&mut self, other: FieldTermLocationMap) {
        for (field, terms) in other.0 {
            match self.0.get_mut(&field) {
                Some(existing) => existing.merge(terms),
                None => {
                    self.0.insert(field, terms);
                }
            }
        }
    }

    fn size(&self) -> usize {
        self.0
            .iter()
            .map(|(field, terms)| field.len() + terms.size())
            .sum()
    }
}

/// A document matched by a searcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatch {
    /// External document id, resolved by collectors.
    pub id: String,
    /// Internal document identifier.
    #[serde(skip)]
    pub index_internal_id: IndexInternalId,
    /// Relevance score.
    pub score: f64,
    /// Scoring explanation, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expl: Option<Explanation>,
    /// Term occurrences per field.
    #[serde(default, skip_serializing_if = "FieldTermLocationMap::is_empty")]
    pub locations: FieldTermLocationMap,
    /// Runs of consecutive token positions, one per matched occurrence.
    #[serde(skip)]
    pub hit_positions: Vec<Vec<u64>>,
    /// Natural index order of the hit.
    #[serde(skip)]
    pub hit_number: u64,
}

impl DocumentMatch {
    /// Create an empty match.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to an empty state, keeping the id and run allocations.
    pub fn reset(&mut self) {
        self.id.clear();
        self.index_internal_id.clear();
        self.score = 0.0;
        self.expl = None;
        self.locations.clear();
        self.hit_positions.clear();
        self.hit_number = 0;
    }

    /// Move the locations and hit runs of `other` into this match.
    pub fn merge_positional_data(&mut self, other: &mut DocumentMatch) {
        self.locations.merge(mem::take(&mut other.locations));
        self.hit_positions.append(&mut other.hit_positions);
    }

    /// Approximate heap and inline size in bytes.
    pub fn size(&self) -> usize {
        mem::size_of::<DocumentMatch>()
            + self.id.len()
            + self.index_internal_id.as_bytes().len()
            + self.expl.as_ref().map(Explanation::size).unwrap_or(0)
            + self.locations.size()
            + self
                .hit_positions
                .iter()
                .map(|run| run.len() * mem::size_of::<u64>())
                .sum::<usize>()
    }
}

impl fmt::Display for DocumentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{:.6}]", self.index_internal_id, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(pos: f64, array_positions: Vec<u64>) -> Location {
        Location {
            pos,
            start: 0,
            end: 0,
            array_positions,
        }
    }

    #[test]
    fn test_same_array_element() {
        assert!(loc(1.0, vec![]).same_array_element(&loc(2.0, vec![])));
        assert!(loc(1.0, vec![0, 2]).same_array_element(&loc(2.0, vec![0, 2])));
        assert!(!loc(1.0, vec![0, 2]).same_array_element(&loc(2.0, vec![0, 3])));
        assert!(!loc(1.0, vec![0]).same_array_element(&loc(2.0, vec![0, 0])));
    }

    #[test]
    fn test_term_location_map_add_and_merge() {
        let mut a = TermLocationMap::new();
        a.add_location("beer", loc(1.0, vec![]));
        a.add_location("beer", loc(5.0, vec![]));

        let mut b = TermLocationMap::new();
        b.add_location("beer", loc(9.0, vec![]));
        b.add_location("marty", loc(2.0, vec![]));

        a.merge(b);
        assert_eq!(a.len(), 2);
        let positions: Vec<f64> = a.get("beer").unwrap().iter().map(|l| l.pos).collect();
        assert_eq!(positions, vec![1.0, 5.0, 9.0]);
        assert_eq!(a.get("marty").unwrap().len(), 1);
    }

    #[test]
    fn test_field_term_location_map_merge() {
        let mut a = FieldTermLocationMap::new();
        a.add_location("desc", "beer", loc(1.0, vec![]));

        let mut b = FieldTermLocationMap::new();
        b.add_location("desc", "beer", loc(3.0, vec![]));
        b.add_location("name", "marty", loc(1.0, vec![]));

        a.merge(b);
        assert_eq!(a.len(), 2);
        let mut fields: Vec<&String> = a.fields().collect();
        fields.sort();
        assert_eq!(fields, vec!["desc", "name"]);
        assert_eq!(a.get("desc").unwrap().get("beer").unwrap().len(), 2);
        assert_eq!(a.get("name").unwrap().get("marty").unwrap().len(), 1);
    }

    #[test]
    fn test_document_match_reset() {
        let mut dm = DocumentMatch::new();
        dm.index_internal_id = IndexInternalId::from_u64(3);
        dm.score = 1.5;
        dm.locations.add_location("desc", "beer", loc(1.0, vec![]));
        dm.hit_positions.push(vec![1]);

        dm.reset();
        assert!(dm.index_internal_id.is_empty());
        assert_eq!(dm.score, 0.0);
        assert!(dm.locations.is_empty());
        assert!(dm.hit_positions.is_empty());
    }

    #[test]
    fn test_merge_positional_data() {
        let mut a = DocumentMatch::new();
        a.hit_positions.push(vec![1]);
        let mut b = DocumentMatch::new();
        b.locations.add_location("desc", "tea", loc(4.0, vec![]));
        b.hit_positions.push(vec![4, 5]);

        a.merge_positional_data(&mut b);
        assert_eq!(a.hit_positions, vec![vec![1], vec![4, 5]]);
        assert!(a.locations.get("desc").is_some());
        assert!(b.locations.is_empty());
        assert!(b.hit_positions.is_empty());
    }

    #[test]
    fn test_document_match_size_grows_with_locations() {
        let mut dm = DocumentMatch::new();
        let empty = dm.size();
        dm.locations.add_location("desc", "beer", loc(1.0, vec![0, 1]));
        assert!(dm.size() > empty);
    }
}
