//! Reconciliation of configuration-managed and multi-instance sources.
//!
//! These sources have no single uuid per handle. Singletons match by type,
//! multi-instance sources match each declared instance against published
//! registration content.

use extsync_core::{IdentifierMap, LocalSource, RemoteSource, TypePolicy};
use extsync_registry::{CreateExtensionInput, RemoteRegistry};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ReconcileError, RemoteOperation};

/// Identifiers of non-canonical sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonCanonicalIds {
    /// Handle to uuids, matches first then creations
    pub uuids: IndexMap<String, Vec<String>>,
    /// Handle to ids, parallel to `uuids`
    pub ids: IndexMap<String, Vec<String>>,
    /// Handle to id of configuration-managed singletons
    pub singleton_ids: IdentifierMap,
}

impl NonCanonicalIds {
    fn push(&mut self, handle: &str, registration: &RemoteSource) {
        self.uuids
            .entry(handle.to_string())
            .or_default()
            .push(registration.uuid.clone());
        self.ids
            .entry(handle.to_string())
            .or_default()
            .push(registration.id.clone());
    }

    fn ensure_entry(&mut self, handle: &str) {
        self.uuids.entry(handle.to_string()).or_default();
        self.ids.entry(handle.to_string()).or_default();
    }
}

/// Match or create the registrations of every non-canonical source.
///
/// A registration in `remote` is consumed at most once across all sources.
/// Every non-canonical handle gets an entry, possibly empty.
pub async fn reconcile_non_canonical(
    registry: &dyn RemoteRegistry,
    api_key: &str,
    local: &[LocalSource],
    remote: &[RemoteSource],
) -> Result<NonCanonicalIds, ReconcileError> {
    let mut result = NonCanonicalIds::default();
    let mut consumed = vec![false; remote.len()];
    let mut created = 0usize;

    for source in local {
        match source.policy {
            TypePolicy::Canonical => continue,
            TypePolicy::ConfigurationManaged => {
                result.ensure_entry(&source.handle);
                let found = remote
                    .iter()
                    .enumerate()
                    .position(|(ri, registration)| !consumed[ri] && source.same_type(registration));
                let registration = match found {
                    Some(ri) => {
                        consumed[ri] = true;
                        debug!(handle = %source.handle, uuid = %remote[ri].uuid, "Matched singleton");
                        remote[ri].clone()
                    }
                    None => {
                        created += 1;
                        create(registry, api_key, source, source.config.clone()).await?
                    }
                };
                result.push(&source.handle, &registration);
                result
                    .singleton_ids
                    .insert(source.handle.clone(), registration.id);
            }
            TypePolicy::MultiInstance => {
                result.ensure_entry(&source.handle);
                let pending = match_instances(source, remote, &mut consumed, &mut result);
                for instance in pending {
                    created += 1;
                    let registration =
                        create(registry, api_key, source, instance.to_string()).await?;
                    result.push(&source.handle, &registration);
                }
            }
        }
    }

    info!(
        handles = result.uuids.len(),
        matched = consumed.iter().filter(|c| **c).count(),
        created,
        "Non-canonical sources reconciled"
    );
    Ok(result)
}

/// Consume registrations whose published content equals a pending instance.
///
/// Returns the instances left unmatched, in declaration order.
fn match_instances<'a>(
    source: &'a LocalSource,
    remote: &[RemoteSource],
    consumed: &mut [bool],
    result: &mut NonCanonicalIds,
) -> Vec<&'a Value> {
    let mut pending: Vec<&Value> = source.instances.iter().collect();

    for (ri, registration) in remote.iter().enumerate() {
        if pending.is_empty() {
            break;
        }
        if consumed[ri] || !source.same_type(registration) {
            continue;
        }
        let Some(published) = registration.published_config() else {
            debug!(
                handle = %source.handle,
                uuid = %registration.uuid,
                "Registration has no published config"
            );
            continue;
        };
        if let Some(position) = pending.iter().position(|instance| **instance == published) {
            pending.remove(position);
            consumed[ri] = true;
            debug!(handle = %source.handle, uuid = %registration.uuid, "Matched instance");
            result.push(&source.handle, registration);
        }
    }

    pending
}

async fn create(
    registry: &dyn RemoteRegistry,
    api_key: &str,
    source: &LocalSource,
    config: String,
) -> Result<RemoteSource, ReconcileError> {
    let input = CreateExtensionInput::for_source_with_config(api_key, source, config);
    registry
        .create_extension(input)
        .await
        .map_err(|e| ReconcileError::remote_call(RemoteOperation::Create, &source.handle, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsync_registry_memory::InMemoryRegistry;
    use serde_json::json;

    fn webhook(instances: Vec<Value>) -> LocalSource {
        LocalSource::new("Webhook Subscription", "webhook_subscription", "WEBHOOK_SUBSCRIPTION")
            .with_policy(TypePolicy::MultiInstance)
            .with_instances(instances)
    }

    fn point_of_sale() -> LocalSource {
        LocalSource::new("Point Of Sale", "point_of_sale", "POINT_OF_SALE")
            .with_policy(TypePolicy::ConfigurationManaged)
    }

    fn orders(topic: &str) -> Value {
        json!({"topic": topic, "uri": "https://my-app.com/webhooks"})
    }

    #[tokio::test]
    async fn test_singleton_matches_by_type() {
        let registry = InMemoryRegistry::new();
        let remote = vec![RemoteSource::new("UUID_C_A", "C_A", "C_A", "POINT_OF_SALE")];

        let result = reconcile_non_canonical(&registry, "appId", &[point_of_sale()], &remote)
            .await
            .unwrap();

        assert_eq!(result.uuids["point-of-sale"], vec!["UUID_C_A"]);
        assert_eq!(result.ids["point-of-sale"], vec!["C_A"]);
        assert_eq!(result.singleton_ids["point-of-sale"], "C_A");
        assert_eq!(registry.create_count().await, 0);
    }

    #[tokio::test]
    async fn test_singleton_created_when_missing() {
        let registry = InMemoryRegistry::new();
        let local = point_of_sale().with_config(r#"{"embedded":true}"#);

        let result = reconcile_non_canonical(&registry, "appId", &[local], &[])
            .await
            .unwrap();

        assert_eq!(registry.create_count().await, 1);
        let created = &registry.snapshot().await.extension_registrations[0];
        assert_eq!(result.uuids["point-of-sale"], vec![created.uuid.clone()]);
        assert_eq!(
            created.active_version.as_ref().map(|v| v.config.as_str()),
            Some(r#"{"embedded":true}"#)
        );
    }

    #[tokio::test]
    async fn test_instances_match_content_then_create() {
        let registry = InMemoryRegistry::new();
        let remote = vec![
            RemoteSource::new("UUID_DELETE", "D", "Webhook", "WEBHOOK_SUBSCRIPTION")
                .with_active_config(&orders("orders/delete")),
            RemoteSource::new("UUID_OTHER", "O", "Webhook", "WEBHOOK_SUBSCRIPTION")
                .with_active_config(&orders("products/update")),
        ];
        let local = webhook(vec![orders("orders/create"), orders("orders/delete")]);

        let result = reconcile_non_canonical(&registry, "appId", &[local], &remote)
            .await
            .unwrap();

        let uuids = &result.uuids["webhook-subscription"];
        assert_eq!(uuids.len(), 2);
        assert_eq!(uuids[0], "UUID_DELETE");
        assert_eq!(result.ids["webhook-subscription"][0], "D");
        assert_eq!(registry.create_count().await, 1);

        let created = &registry.snapshot().await.extension_registrations[0];
        assert_eq!(uuids[1], created.uuid);
        assert_eq!(created.published_config(), Some(orders("orders/create")));
        assert!(result.singleton_ids.is_empty());
    }

    #[tokio::test]
    async fn test_instances_fully_matched_create_nothing() {
        let registry = InMemoryRegistry::new();
        let remote = vec![
            RemoteSource::new("UUID_1", "1", "Webhook", "WEBHOOK_SUBSCRIPTION")
                .with_active_config(&orders("orders/create")),
            RemoteSource::new("UUID_2", "2", "Webhook", "WEBHOOK_SUBSCRIPTION")
                .with_active_config(&orders("orders/create")),
        ];
        let local = webhook(vec![orders("orders/create"), orders("orders/create")]);

        let result = reconcile_non_canonical(&registry, "appId", &[local], &remote)
            .await
            .unwrap();

        assert_eq!(result.uuids["webhook-subscription"], vec!["UUID_1", "UUID_2"]);
        assert_eq!(registry.create_count().await, 0);
    }

    #[tokio::test]
    async fn test_unpublished_registration_never_matches() {
        let registry = InMemoryRegistry::new();
        let remote = vec![RemoteSource::new("UUID_1", "1", "Webhook", "WEBHOOK_SUBSCRIPTION")];
        let local = webhook(vec![orders("orders/create")]);

        let result = reconcile_non_canonical(&registry, "appId", &[local], &remote)
            .await
            .unwrap();

        assert_eq!(registry.create_count().await, 1);
        assert_ne!(result.uuids["webhook-subscription"][0], "UUID_1");
    }

    #[tokio::test]
    async fn test_empty_multi_instance_has_entry() {
        let registry = InMemoryRegistry::new();
        let canonical = LocalSource::new("A", "function", "FUNCTION");

        let result = reconcile_non_canonical(&registry, "appId", &[canonical, webhook(vec![])], &[])
            .await
            .unwrap();

        assert_eq!(result.uuids.len(), 1);
        assert!(result.uuids["webhook-subscription"].is_empty());
        assert_eq!(registry.mutation_count().await, 0);
    }
}
