// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token auth for the REST façade (§4.11): resolves
//! `Authorization: Bearer <token>` to an `org_id` via the in-memory API-key
//! table seeded from `Config::api_keys` (§4.2's realization note — the same
//! table agents use to `RegisterAgent`).

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use dispatchd_core::config::ApiKeyEntry;
use dispatchd_core::OrgId;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ApiKeyTable(Arc<HashMap<String, OrgId>>);

impl ApiKeyTable {
    pub fn new(entries: &[ApiKeyEntry]) -> Self {
        Self(Arc::new(entries.iter().map(|e| (e.api_key.clone(), OrgId::from(e.org_id.as_str()))).collect()))
    }

    pub fn resolve(&self, token: &str) -> Option<OrgId> {
        self.0.get(token).copied()
    }
}

/// Extractor proving the request carried a valid bearer token; handlers take
/// `AuthedOrg` as an argument to scope every query by `org_id`.
pub struct AuthedOrg(pub OrgId);

impl<S> FromRequestParts<S> for AuthedOrg
where
    S: Send + Sync,
    ApiKeyTable: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let table = ApiKeyTable::from_ref(state);
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header"))?;
        let token = header.strip_prefix("Bearer ").ok_or((StatusCode::UNAUTHORIZED, "malformed Authorization header"))?;
        let org_id = table.resolve(token).ok_or((StatusCode::UNAUTHORIZED, "unknown API key"))?;
        Ok(AuthedOrg(org_id))
    }
}
