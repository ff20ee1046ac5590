//! Per-request ambient context store.
//!
//! Values live in a tokio task-local that is re-established around every
//! request future. A scope is a copy-on-write snapshot of its parent's
//! bindings, so writes made while one request is polled are invisible to any
//! other request, including requests interleaved on the same worker thread.
//!
//! Bindings are acquired through scopes ([`bind`], [`scope`]) or guards
//! ([`set_scoped`]). Both revert on every exit path: completion, error,
//! panic, and cancellation (the future being dropped mid-flight).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::futures::TaskLocalFuture;
use uuid::Uuid;

/// Tenant reported when a request did not name one.
pub const DEFAULT_TENANT: &str = "public";

/// A named slot in the context store, with an optional fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey {
    name: &'static str,
    default: Option<&'static str>,
}

impl ContextKey {
    /// Creates a key with no default value.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
        }
    }

    /// Creates a key that reads as `default` whenever it is unbound.
    #[must_use]
    pub const fn with_default(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }

    /// Field name, also used as the structured-log field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&'static str> {
        self.default
    }
}

/// Correlation ID of the request being processed.
pub const REQUEST_ID: ContextKey = ContextKey::new("request_id");

/// Tenant of the request being processed. Reads as [`DEFAULT_TENANT`] when unbound.
pub const TENANT_ID: ContextKey = ContextKey::with_default("tenant_id", DEFAULT_TENANT);

/// Copy-on-write map of the values bound in one scope.
///
/// Cloning is an `Arc` bump; the map is only copied when a scope that shares
/// it writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(Arc<BTreeMap<&'static str, String>>);

impl Bindings {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: &'static str, value: String) -> Option<String> {
        Arc::make_mut(&mut self.0).insert(name, value)
    }

    fn remove(&mut self, name: &str) -> Option<String> {
        if self.0.contains_key(name) {
            Arc::make_mut(&mut self.0).remove(name)
        } else {
            None
        }
    }
}

tokio::task_local! {
    static SCOPE: RefCell<Bindings>;
}

/// A future running inside its own context scope.
pub type Scoped<F> = TaskLocalFuture<RefCell<Bindings>, F>;

/// Receipt for a [`set`] call; hand it to [`reset`] to restore the prior value.
#[must_use = "dropping a token without `reset` leaves the binding in place"]
#[derive(Debug)]
pub struct Token {
    key: ContextKey,
    prior: Option<String>,
    attached: bool,
}

impl Token {
    #[must_use]
    pub fn key(&self) -> ContextKey {
        self.key
    }
}

/// Binds `key` in the current scope and returns a token holding the prior value.
///
/// Outside any scope this is a no-op and the returned token resets nothing.
pub fn set(key: ContextKey, value: impl Into<String>) -> Token {
    let value = value.into();
    match SCOPE.try_with(|cell| cell.borrow_mut().insert(key.name, value)) {
        Ok(prior) => Token {
            key,
            prior,
            attached: true,
        },
        Err(_) => {
            tracing::debug!(key = key.name, "context set outside a request scope ignored");
            Token {
                key,
                prior: None,
                attached: false,
            }
        }
    }
}

/// Restores the value `key` had before the [`set`] call that produced `token`.
pub fn reset(token: Token) {
    if !token.attached {
        return;
    }
    let Token { key, prior, .. } = token;
    let _ = SCOPE.try_with(|cell| {
        let mut bindings = cell.borrow_mut();
        match prior {
            Some(value) => {
                bindings.insert(key.name, value);
            }
            None => {
                bindings.remove(key.name);
            }
        }
    });
}

/// Returns the value bound to `key`, falling back to the key's default.
#[must_use]
pub fn get(key: ContextKey) -> Option<String> {
    SCOPE
        .try_with(|cell| cell.borrow().get(key.name).map(str::to_owned))
        .ok()
        .flatten()
        .or_else(|| key.default.map(str::to_owned))
}

/// Returns `true` when called from inside a context scope.
#[must_use]
pub fn in_scope() -> bool {
    SCOPE.try_with(|_| ()).is_ok()
}

/// Returns a copy of the current scope's bindings (empty outside any scope).
#[must_use]
pub fn snapshot() -> Bindings {
    SCOPE
        .try_with(|cell| cell.borrow().clone())
        .unwrap_or_default()
}

/// Runs `fut` in a new scope seeded with a snapshot of the caller's bindings.
///
/// The snapshot is taken now, not on first poll, so the returned future can
/// be handed to `tokio::spawn` and the spawned task inherits the caller's
/// context. Writes inside `fut` never reach the caller.
pub fn scope<F: Future>(fut: F) -> Scoped<F> {
    SCOPE.scope(RefCell::new(snapshot()), fut)
}

/// Runs `fut` in a new scope where `key` is bound to `value`.
///
/// The binding exists only while `fut` is being polled and disappears with
/// it, however `fut` terminates.
pub fn bind<F: Future>(key: ContextKey, value: impl Into<String>, fut: F) -> Scoped<F> {
    let mut bindings = snapshot();
    bindings.insert(key.name, value.into());
    SCOPE.scope(RefCell::new(bindings), fut)
}

/// RAII form of [`set`]/[`reset`] for nested bindings inside one scope.
#[must_use = "the binding is reverted as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ContextGuard {
    token: Option<Token>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            reset(token);
        }
    }
}

/// Binds `key` until the returned guard is dropped.
pub fn set_scoped(key: ContextKey, value: impl Into<String>) -> ContextGuard {
    ContextGuard {
        token: Some(set(key, value)),
    }
}

/// Generates a fresh correlation ID: a hyphenated, lowercase UUID v4.
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Per-request identity as seen by business logic and error translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// Correlation ID, `None` outside the request pipeline.
    pub request_id: Option<String>,
    /// Resolved tenant, [`DEFAULT_TENANT`] when none was supplied.
    pub tenant_id: String,
}

impl RequestContext {
    /// Reads the request context of the calling task.
    #[must_use]
    pub fn current() -> Self {
        Self {
            request_id: get(REQUEST_ID),
            tenant_id: get(TENANT_ID).unwrap_or_else(|| DEFAULT_TENANT.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn defaults_apply_outside_any_scope() {
        assert!(!in_scope());
        assert_eq!(get(REQUEST_ID), None);
        assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));
        assert!(snapshot().is_empty());
    }

    #[test]
    fn set_outside_scope_is_a_noop() {
        let token = set(TENANT_ID, "acme");
        assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));
        reset(token);
        assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));
    }

    #[tokio::test]
    async fn reset_restores_exact_prior_values() {
        scope(async {
            let outer = set(TENANT_ID, "outer");
            let inner = set(TENANT_ID, "inner");
            assert_eq!(get(TENANT_ID).as_deref(), Some("inner"));

            reset(inner);
            assert_eq!(get(TENANT_ID).as_deref(), Some("outer"));

            reset(outer);
            assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));
            assert!(snapshot().is_empty());
        })
        .await;
    }

    #[tokio::test]
    async fn bind_is_visible_only_while_polled() {
        let seen = bind(REQUEST_ID, "req-1", async { get(REQUEST_ID) }).await;
        assert_eq!(seen.as_deref(), Some("req-1"));
        assert_eq!(get(REQUEST_ID), None);
    }

    #[tokio::test]
    async fn nested_bind_inherits_and_does_not_write_back() {
        bind(REQUEST_ID, "req-1", async {
            bind(TENANT_ID, "acme", async {
                assert_eq!(get(REQUEST_ID).as_deref(), Some("req-1"));
                assert_eq!(get(TENANT_ID).as_deref(), Some("acme"));
                let _ = set(REQUEST_ID, "overwritten");
            })
            .await;

            assert_eq!(get(REQUEST_ID).as_deref(), Some("req-1"));
            assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));
        })
        .await;
    }

    #[tokio::test]
    async fn guard_reverts_on_drop() {
        bind(TENANT_ID, "acme", async {
            {
                let _guard = set_scoped(TENANT_ID, "nested");
                assert_eq!(get(TENANT_ID).as_deref(), Some("nested"));
            }
            assert_eq!(get(TENANT_ID).as_deref(), Some("acme"));
        })
        .await;
    }

    #[tokio::test]
    async fn interleaved_scopes_on_one_thread_are_isolated() {
        async fn request(tenant: &'static str) -> Vec<String> {
            bind(TENANT_ID, tenant, async move {
                let mut seen = Vec::new();
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                    seen.push(get(TENANT_ID).unwrap_or_default());
                }
                seen
            })
            .await
        }

        let (a, b) = tokio::join!(request("tenant-a"), request("tenant-b"));
        assert!(a.iter().all(|t| t == "tenant-a"));
        assert!(b.iter().all(|t| t == "tenant-b"));
        assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));
    }

    #[tokio::test]
    async fn spawned_task_inherits_snapshot() {
        let inherited = bind(TENANT_ID, "acme", async {
            let handle = tokio::spawn(scope(async { get(TENANT_ID) }));
            let _ = set(TENANT_ID, "changed-after-spawn");
            handle.await.ok().flatten()
        })
        .await;
        assert_eq!(inherited.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn cancelled_scope_leaves_nothing_behind() {
        let outcome = tokio::time::timeout(
            Duration::from_millis(10),
            bind(TENANT_ID, "slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(get(TENANT_ID).as_deref(), Some(DEFAULT_TENANT));

        let next = bind(REQUEST_ID, "next", async { RequestContext::current() }).await;
        assert_eq!(next.tenant_id, DEFAULT_TENANT);
        assert_eq!(next.request_id.as_deref(), Some("next"));
    }

    #[test]
    fn generated_ids_are_lowercase_uuid_v4() {
        let id = generate_request_id();
        let parsed = Uuid::parse_str(&id).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id, id.to_lowercase());
        assert_eq!(id.len(), 36);
        assert_ne!(id, generate_request_id());
    }

    async fn observe(tenant: String, yields: Vec<u8>) -> Vec<String> {
        bind(TENANT_ID, tenant, async move {
            let mut seen = Vec::with_capacity(yields.len());
            for n in yields {
                for _ in 0..n {
                    tokio::task::yield_now().await;
                }
                seen.push(get(TENANT_ID).unwrap_or_default());
            }
            seen
        })
        .await
    }

    proptest! {
        #[test]
        fn interleavings_never_cross_contaminate(
            tenant_a in "[a-z]{1,12}",
            tenant_b in "[A-Z]{1,12}",
            yields_a in proptest::collection::vec(0u8..4, 1..8),
            yields_b in proptest::collection::vec(0u8..4, 1..8),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            let (seen_a, seen_b) = rt.block_on(async {
                tokio::join!(
                    observe(tenant_a.clone(), yields_a),
                    observe(tenant_b.clone(), yields_b),
                )
            });
            prop_assert!(seen_a.iter().all(|t| *t == tenant_a));
            prop_assert!(seen_b.iter().all(|t| *t == tenant_b));
        }
    }
}
