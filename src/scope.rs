//! Tenant scope resolution
//!
//! Derives, once per request, which country's rows the caller may see or
//! mutate. Only SUPERADMIN may widen or move the scope via the request;
//! COUNTRY_ADMIN and OPERATOR are always pinned to their own country no
//! matter what the request supplies. An account of a pinned role with no
//! country resolves to a scope that matches nothing.

use crate::auth::{Identity, Role};
use crate::error::AppError;
use axum::http::HeaderMap;
use std::future::Future;
use tracing::debug;

/// Header consulted for a country override when the query parameter is absent.
pub const COUNTRY_HEADER: &str = "x-country";

/// Resolved per-request visibility over country-partitioned data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// All countries visible. Reachable only by SUPERADMIN with no override.
    Global,
    /// Pinned to one country. A `country_id` of `None` matches nothing.
    Fixed {
        country_id: Option<i32>,
        /// Override code as supplied, kept for logging; `None` for pinned roles.
        country_code: Option<String>,
    },
}

/// The filter a scoped query actually applies.
///
/// Data access always filters on the country id; code-keyed tables reconcile
/// by joining `countries` on code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    /// No country filter.
    All,
    /// Rows of exactly this country.
    Country(i32),
    /// No rows at all.
    Nothing,
}

impl TenantScope {
    pub fn filter(&self) -> ScopeFilter {
        match self {
            TenantScope::Global => ScopeFilter::All,
            TenantScope::Fixed {
                country_id: Some(id),
                ..
            } => ScopeFilter::Country(*id),
            TenantScope::Fixed {
                country_id: None, ..
            } => ScopeFilter::Nothing,
        }
    }
}

/// Lookup seam used by the resolver to translate a country code to its id.
///
/// Implemented by `CountryService` against Postgres and by in-memory fakes in
/// tests.
pub trait CountryDirectory {
    fn country_id_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<i32>, AppError>> + Send;
}

/// Pick the override country code from the request, if any.
///
/// The `country` query parameter wins over the `x-country` header when both
/// are present. Codes are normalized to uppercase at this boundary.
pub fn country_override(query: Option<&str>, headers: &HeaderMap) -> Option<String> {
    let from_query = query.map(str::trim).filter(|s| !s.is_empty());
    let from_header = headers
        .get(COUNTRY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    from_query.or(from_header).map(|s| s.to_ascii_uppercase())
}

/// Compute the effective tenant scope for this request.
///
/// For SUPERADMIN an unknown override code is not an error: it resolves to a
/// scope that yields empty result sets, so list endpoints degrade gracefully.
pub async fn resolve_tenant_scope<D: CountryDirectory>(
    identity: &Identity,
    override_code: Option<&str>,
    directory: &D,
) -> Result<TenantScope, AppError> {
    match identity.role {
        Role::Superadmin => match override_code {
            None => Ok(TenantScope::Global),
            Some(code) => {
                let country_id = directory.country_id_by_code(code).await?;
                if country_id.is_none() {
                    debug!(code, "Country override does not match any country");
                }
                Ok(TenantScope::Fixed {
                    country_id,
                    country_code: Some(code.to_string()),
                })
            }
        },
        // Pinned roles: caller-supplied override is ignored entirely.
        // A missing country on the account fails closed.
        Role::CountryAdmin | Role::Operator => Ok(TenantScope::Fixed {
            country_id: identity.country_id,
            country_code: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::collections::HashMap;

    struct FakeDirectory(HashMap<String, i32>);

    impl FakeDirectory {
        fn with(entries: &[(&str, i32)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(code, id)| (code.to_string(), *id))
                    .collect(),
            )
        }
    }

    impl CountryDirectory for FakeDirectory {
        async fn country_id_by_code(&self, code: &str) -> Result<Option<i32>, AppError> {
            Ok(self.0.get(code).copied())
        }
    }

    fn identity(role: Role, country_id: Option<i32>) -> Identity {
        Identity {
            id: 42,
            role,
            country_id,
        }
    }

    #[tokio::test]
    async fn superadmin_without_override_sees_everything() {
        let directory = FakeDirectory::with(&[("HR", 1), ("SI", 2)]);
        let scope = resolve_tenant_scope(&identity(Role::Superadmin, None), None, &directory)
            .await
            .unwrap();
        assert_eq!(scope, TenantScope::Global);
        assert_eq!(scope.filter(), ScopeFilter::All);
    }

    #[tokio::test]
    async fn superadmin_override_pins_to_resolved_country() {
        let directory = FakeDirectory::with(&[("HR", 1), ("SI", 2)]);
        let scope = resolve_tenant_scope(&identity(Role::Superadmin, None), Some("SI"), &directory)
            .await
            .unwrap();
        assert_eq!(scope.filter(), ScopeFilter::Country(2));
    }

    #[tokio::test]
    async fn superadmin_unknown_override_matches_nothing() {
        let directory = FakeDirectory::with(&[("HR", 1)]);
        let scope = resolve_tenant_scope(&identity(Role::Superadmin, None), Some("XX"), &directory)
            .await
            .unwrap();
        assert_eq!(scope.filter(), ScopeFilter::Nothing);
    }

    #[tokio::test]
    async fn pinned_roles_ignore_every_override() {
        let directory = FakeDirectory::with(&[("HR", 1), ("SI", 2)]);
        for role in [Role::CountryAdmin, Role::Operator] {
            for override_code in [None, Some("SI"), Some("XX"), Some("")] {
                let scope =
                    resolve_tenant_scope(&identity(role, Some(1)), override_code, &directory)
                        .await
                        .unwrap();
                assert_eq!(scope.filter(), ScopeFilter::Country(1));
            }
        }
    }

    #[tokio::test]
    async fn pinned_role_without_country_fails_closed() {
        let directory = FakeDirectory::with(&[("HR", 1)]);
        let scope = resolve_tenant_scope(&identity(Role::CountryAdmin, None), Some("HR"), &directory)
            .await
            .unwrap();
        assert_eq!(scope.filter(), ScopeFilter::Nothing);
    }

    #[test]
    fn query_parameter_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COUNTRY_HEADER, HeaderValue::from_static("si"));
        assert_eq!(
            country_override(Some("hr"), &headers),
            Some("HR".to_string())
        );
        assert_eq!(country_override(None, &headers), Some("SI".to_string()));
    }

    #[test]
    fn blank_override_values_are_ignored() {
        let headers = HeaderMap::new();
        assert_eq!(country_override(None, &headers), None);
        assert_eq!(country_override(Some("   "), &headers), None);
    }
}
