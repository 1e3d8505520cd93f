//! Reproducibility receipts.
//!
//! A receipt names the exact inputs a search ran against: a content
//! hash of the ciphertext, a content hash of the serialized route
//! table, and the recipe string describing the enumerated space. The
//! run id is derived from that content (UUID v5), so identical inputs
//! always produce the identical receipt — downstream collaborators can
//! verify a result came from specific, named inputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alphabet::{render_text, Letter};
use crate::error::{SolverError, SolverResult};
use crate::route::{Route, RouteDescriptor};

/// Namespace for content-derived run ids ("keywheel.receipt").
const RECEIPT_NAMESPACE: Uuid = Uuid::from_bytes(*b"keywheel.receipt");

/// Names the inputs a search was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// blake3 hex digest of the ciphertext.
    pub ciphertext_digest: String,

    /// blake3 hex digest of the serialized route table.
    pub route_digest: String,

    /// Description of the enumerated space.
    pub recipe: String,

    /// Content-derived run identifier.
    pub run_id: Uuid,
}

impl Receipt {
    /// Builds a receipt over a ciphertext, a route table, and a recipe.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the route table cannot be
    /// encoded.
    pub fn new(
        ciphertext: &[Letter],
        routes: &[Route],
        recipe: impl Into<String>,
    ) -> SolverResult<Self> {
        let recipe = recipe.into();
        let ciphertext_digest = blake3::hash(render_text(ciphertext).as_bytes())
            .to_hex()
            .to_string();

        let descriptors: Vec<RouteDescriptor> =
            routes.iter().cloned().map(RouteDescriptor::from).collect();
        let route_bytes = serde_json::to_vec(&descriptors)
            .map_err(|e| SolverError::serialization(e.to_string()))?;
        let route_digest = blake3::hash(&route_bytes).to_hex().to_string();

        let preimage = format!("{ciphertext_digest}\n{route_digest}\n{recipe}");
        let run_id = Uuid::new_v5(&RECEIPT_NAMESPACE, preimage.as_bytes());

        Ok(Self {
            ciphertext_digest,
            route_digest,
            recipe,
            run_id,
        })
    }

    /// Recomputes digests from the supplied inputs and compares.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the route table cannot be
    /// encoded.
    pub fn verify(&self, ciphertext: &[Letter], routes: &[Route]) -> SolverResult<bool> {
        let recomputed = Self::new(ciphertext, routes, self.recipe.clone())?;
        Ok(recomputed == *self)
    }
}
