//! Transposition routes.
//!
//! A route is an invertible permutation of text positions applied before
//! wheel decryption and inverted after. Routes are typically loaded from
//! serialized permutation tables keyed by an identifier; every table is
//! validated once at construction — never per character.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// The serialized form of a route: `{id, order, excluded}`.
///
/// This is the wire shape collaborators supply; [`Route`] construction
/// validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Identifier the route table is keyed by.
    pub id: String,

    /// Permutation table: output position `i` reads input position
    /// `order[i]`.
    pub order: Vec<usize>,

    /// Positions the permutation does not touch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<usize>,
}

/// A validated, invertible transposition of `0..n`.
///
/// Invariants, established at construction and preserved thereafter:
/// `order` is a bijection on `0..n`; every excluded position is a fixed
/// point of `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RouteDescriptor", into = "RouteDescriptor")]
pub struct Route {
    id: String,
    order: Vec<usize>,
    excluded: BTreeSet<usize>,
    inverse: Vec<usize>,
}

impl Route {
    /// Builds a route from a permutation table and excluded positions.
    ///
    /// # Errors
    ///
    /// Returns a `RouteError` when `order` is not a permutation of
    /// `0..order.len()`, or when an excluded position is out of range or
    /// moved by the permutation.
    pub fn new(
        id: impl Into<String>,
        order: Vec<usize>,
        excluded: impl IntoIterator<Item = usize>,
    ) -> Result<Self, RouteError> {
        let id = id.into();
        let n = order.len();

        let mut inverse = vec![usize::MAX; n];
        for (i, &source) in order.iter().enumerate() {
            if source >= n || inverse[source] != usize::MAX {
                return Err(RouteError::NotAPermutation {
                    route_id: id,
                    position: i,
                });
            }
            inverse[source] = i;
        }

        let excluded: BTreeSet<usize> = excluded.into_iter().collect();
        for &position in &excluded {
            if position >= n {
                return Err(RouteError::ExcludedOutOfRange {
                    route_id: id,
                    position,
                });
            }
            if order[position] != position {
                return Err(RouteError::ExcludedNotFixed {
                    route_id: id,
                    position,
                });
            }
        }

        Ok(Self {
            id,
            order,
            excluded,
            inverse,
        })
    }

    /// The identity route over `0..n`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            id: "identity".to_string(),
            order: (0..n).collect(),
            excluded: BTreeSet::new(),
            inverse: (0..n).collect(),
        }
    }

    /// Identifier of this route.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Length of the permuted text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True for a zero-length route.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The permutation table.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Positions declared untouched by the permutation.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<usize> {
        &self.excluded
    }

    /// Applies the permutation: output position `i` reads input
    /// position `order[i]`.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::LengthMismatch` when the text length differs
    /// from the route length.
    pub fn apply<T: Clone>(&self, text: &[T]) -> Result<Vec<T>, RouteError> {
        self.check_len(text.len())?;
        Ok(self.order.iter().map(|&source| text[source].clone()).collect())
    }

    /// Inverts the permutation: `invert(apply(text)) == text`.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::LengthMismatch` when the text length differs
    /// from the route length.
    pub fn invert<T: Clone>(&self, text: &[T]) -> Result<Vec<T>, RouteError> {
        self.check_len(text.len())?;
        let mut out = text.to_vec();
        for (i, item) in text.iter().enumerate() {
            out[self.order[i]] = item.clone();
        }
        Ok(out)
    }

    /// The key-schedule position that serves original text position
    /// `index`: the slot of the routed text holding that symbol.
    ///
    /// `index` must be below `len()`; the solver validates constraint
    /// indexes and text lengths before schedule lookups.
    #[must_use]
    pub fn wheel_position(&self, index: usize) -> usize {
        self.inverse[index]
    }

    /// The original text position feeding schedule position `position`.
    #[must_use]
    pub fn source_index(&self, position: usize) -> usize {
        self.order[position]
    }

    /// Admission check for "NA-only" policies: every protected position
    /// must be untouched by the permutation.
    ///
    /// Runs once per route, at admission time.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::DomainOverlap` listing how many protected
    /// positions the permutation moves.
    pub fn require_fixed(&self, protected: &BTreeSet<usize>) -> Result<(), RouteError> {
        let moved: Vec<usize> = protected
            .iter()
            .copied()
            .filter(|&p| p < self.order.len() && self.order[p] != p)
            .collect();
        match moved.first() {
            None => Ok(()),
            Some(&first) => Err(RouteError::DomainOverlap {
                route_id: self.id.clone(),
                count: moved.len(),
                first,
            }),
        }
    }

    fn check_len(&self, len: usize) -> Result<(), RouteError> {
        if len == self.order.len() {
            Ok(())
        } else {
            Err(RouteError::LengthMismatch {
                route_id: self.id.clone(),
                expected: self.order.len(),
                found: len,
            })
        }
    }
}

impl TryFrom<RouteDescriptor> for Route {
    type Error = RouteError;

    fn try_from(descriptor: RouteDescriptor) -> Result<Self, Self::Error> {
        Self::new(descriptor.id, descriptor.order, descriptor.excluded)
    }
}

impl From<Route> for RouteDescriptor {
    fn from(route: Route) -> Self {
        Self {
            id: route.id,
            order: route.order,
            excluded: route.excluded.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reversal(n: usize) -> Route {
        Route::new("reversal", (0..n).rev().collect(), []).unwrap()
    }

    #[test]
    fn apply_and_invert_are_mutual_inverses() {
        let route = reversal(7);
        let text: Vec<u8> = (10..17).collect();
        let routed = route.apply(&text).unwrap();
        assert_eq!(routed, vec![16, 15, 14, 13, 12, 11, 10]);
        assert_eq!(route.invert(&routed).unwrap(), text);
    }

    #[test]
    fn identity_route_is_transparent() {
        let route = Route::identity(5);
        let text = vec!['a', 'b', 'c', 'd', 'e'];
        assert_eq!(route.apply(&text).unwrap(), text);
        assert_eq!(route.invert(&text).unwrap(), text);
        assert_eq!(route.wheel_position(3), 3);
    }

    #[test]
    fn excluded_positions_pass_through() {
        // Swap 0 and 2, leave 1 fixed and excluded.
        let route = Route::new("swap", vec![2, 1, 0], [1]).unwrap();
        let text = vec!['x', 'y', 'z'];
        let routed = route.apply(&text).unwrap();
        assert_eq!(routed, vec!['z', 'y', 'x']);
        assert_eq!(routed[1], text[1]);
        assert_eq!(route.invert(&routed).unwrap(), text);
    }

    #[test]
    fn wheel_position_inverts_order() {
        let route = reversal(10);
        for i in 0..10 {
            assert_eq!(route.source_index(route.wheel_position(i)), i);
        }
    }

    #[test]
    fn rejects_non_permutations() {
        let err = Route::new("dup", vec![0, 0, 2], []).unwrap_err();
        assert!(matches!(err, RouteError::NotAPermutation { position: 1, .. }));

        let err = Route::new("range", vec![0, 3], []).unwrap_err();
        assert!(matches!(err, RouteError::NotAPermutation { .. }));
    }

    #[test]
    fn rejects_moved_excluded_positions() {
        let err = Route::new("bad", vec![1, 0], [0]).unwrap_err();
        assert!(matches!(err, RouteError::ExcludedNotFixed { position: 0, .. }));

        let err = Route::new("oob", vec![0, 1], [5]).unwrap_err();
        assert!(matches!(err, RouteError::ExcludedOutOfRange { position: 5, .. }));
    }

    #[test]
    fn require_fixed_reports_overlap() {
        let route = reversal(10);
        let protected: BTreeSet<usize> = [2, 5, 9].into_iter().collect();
        let err = route.require_fixed(&protected).unwrap_err();
        assert!(matches!(
            err,
            RouteError::DomainOverlap { count: 3, first: 2, .. }
        ));

        // A permutation fixing the protected positions is admitted.
        let route = Route::new("partial", vec![1, 0, 2, 4, 3], []).unwrap();
        let protected: BTreeSet<usize> = [2].into_iter().collect();
        assert!(route.require_fixed(&protected).is_ok());
    }

    #[test]
    fn length_mismatch_is_detected() {
        let route = reversal(4);
        let err = route.apply(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            RouteError::LengthMismatch {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn descriptor_serde_round_trip() {
        let route = Route::new("swap", vec![2, 1, 0], [1]).unwrap();
        let json = serde_json::to_string(&route).unwrap();
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(route, back);
    }

    #[test]
    fn descriptor_deserialization_validates() {
        let bad = r#"{"id":"dup","order":[0,0,2]}"#;
        assert!(serde_json::from_str::<Route>(bad).is_err());
    }
}
