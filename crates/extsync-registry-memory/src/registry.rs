use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use extsync_core::{ActiveVersion, DraftVersion, RemoteSource};
use extsync_registry::{
    CreateExtensionInput, MigrateTypeInput, RegistryError, RemoteListing, RemoteRegistry,
};
use tokio::sync::RwLock;
use tracing::debug;

/// A call received by the registry, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    List { api_key: String },
    Create(CreateExtensionInput),
    Migrate(MigrateTypeInput),
}

impl RegistryCall {
    /// Whether this call changes remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RegistryCall::List { .. })
    }
}

/// Behaviour knobs for the in-memory backend.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Publish the created config as the active version right away.
    pub publish_on_create: bool,
    /// Fail every create after this many successful ones.
    pub fail_creates_after: Option<usize>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            publish_on_create: true,
            fail_creates_after: None,
        }
    }
}

/// In-process registry backend.
///
/// This implementation provides:
/// - Listing, creation and type migration over a [`RemoteListing`]
/// - A log of every call for assertions
/// - Queued create responses to pin the uuid/id a create returns
/// - JSON state file persistence
#[derive(Debug)]
pub struct InMemoryRegistry {
    state: RwLock<RemoteListing>,
    calls: RwLock<Vec<RegistryCall>>,
    create_responses: RwLock<VecDeque<RemoteSource>>,
    id_counter: AtomicU64,
    successful_creates: AtomicUsize,
    options: RegistryOptions,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::from_listing(RemoteListing::default())
    }

    /// Creates a registry seeded with `listing`.
    pub fn from_listing(listing: RemoteListing) -> Self {
        let seed = next_id_seed(&listing);
        Self {
            state: RwLock::new(listing),
            calls: RwLock::new(Vec::new()),
            create_responses: RwLock::new(VecDeque::new()),
            id_counter: AtomicU64::new(seed),
            successful_creates: AtomicUsize::new(0),
            options: RegistryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads a registry from a JSON state file. A missing file is an empty registry.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!("Registry state file does not exist: {:?}", path);
            return Ok(Self::new());
        }
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RegistryError::internal(format!("Failed to read {}: {e}", path.display()))
        })?;
        let listing: RemoteListing = serde_json::from_str(&content)?;
        Ok(Self::from_listing(listing))
    }

    /// Writes the current state to a JSON file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&*self.state.read().await)?;
        tokio::fs::write(path, content).await.map_err(|e| {
            RegistryError::internal(format!("Failed to write {}: {e}", path.display()))
        })
    }

    /// Makes the next create return `registration` instead of a generated one.
    pub async fn queue_create_response(&self, registration: RemoteSource) {
        self.create_responses.write().await.push_back(registration);
    }

    /// Current state.
    pub async fn snapshot(&self) -> RemoteListing {
        self.state.read().await.clone()
    }

    /// Every call received so far.
    pub async fn calls(&self) -> Vec<RegistryCall> {
        self.calls.read().await.clone()
    }

    pub async fn create_count(&self) -> usize {
        self.count_calls(|call| matches!(call, RegistryCall::Create(_)))
            .await
    }

    pub async fn migrate_count(&self) -> usize {
        self.count_calls(|call| matches!(call, RegistryCall::Migrate(_)))
            .await
    }

    /// Create and migrate calls, including failed ones.
    pub async fn mutation_count(&self) -> usize {
        self.count_calls(RegistryCall::is_mutation).await
    }

    async fn count_calls(&self, predicate: impl Fn(&RegistryCall) -> bool) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn next_id(&self) -> String {
        self.id_counter.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn build_registration(&self, input: CreateExtensionInput) -> RemoteSource {
        let id = self.next_id();
        let active_version = self.options.publish_on_create.then(|| ActiveVersion {
            config: input.config.clone(),
        });
        RemoteSource {
            uuid: uuid::Uuid::new_v4().to_string(),
            id: id.clone(),
            title: input.title,
            kind: input.kind,
            context: input.context,
            active_version,
            draft_version: Some(DraftVersion {
                config: input.config,
                registration_id: Some(id),
                last_user_interaction_at: None,
                validation_errors: Vec::new(),
            }),
        }
    }
}

/// First numeric id above everything already in the listing.
fn next_id_seed(listing: &RemoteListing) -> u64 {
    listing
        .extension_registrations
        .iter()
        .chain(&listing.configuration_registrations)
        .chain(&listing.dashboard_managed_registrations)
        .filter_map(|registration| registration.id.parse::<u64>().ok())
        .max()
        .map(|max| max + 1)
        .unwrap_or(1000)
}

#[async_trait]
impl RemoteRegistry for InMemoryRegistry {
    async fn list_registrations(&self, api_key: &str) -> Result<RemoteListing, RegistryError> {
        self.calls.write().await.push(RegistryCall::List {
            api_key: api_key.to_string(),
        });
        Ok(self.state.read().await.clone())
    }

    async fn create_extension(
        &self,
        input: CreateExtensionInput,
    ) -> Result<RemoteSource, RegistryError> {
        self.calls
            .write()
            .await
            .push(RegistryCall::Create(input.clone()));

        if let Some(limit) = self.options.fail_creates_after {
            if self.successful_creates.load(Ordering::SeqCst) >= limit {
                return Err(RegistryError::connection(format!(
                    "create of '{}' failed after {limit} successful creates",
                    input.handle
                )));
            }
        }

        let queued = self.create_responses.write().await.pop_front();
        let registration = match queued {
            Some(registration) => registration,
            None => self.build_registration(input),
        };

        self.state
            .write()
            .await
            .extension_registrations
            .push(registration.clone());
        self.successful_creates.fetch_add(1, Ordering::SeqCst);

        debug!(
            uuid = %registration.uuid,
            id = %registration.id,
            kind = %registration.kind,
            "Created registration"
        );
        Ok(registration)
    }

    async fn migrate_type(&self, input: MigrateTypeInput) -> Result<(), RegistryError> {
        self.calls
            .write()
            .await
            .push(RegistryCall::Migrate(input.clone()));

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let registration = state
            .extension_registrations
            .iter_mut()
            .chain(state.configuration_registrations.iter_mut())
            .chain(state.dashboard_managed_registrations.iter_mut())
            .find(|registration| registration.id == input.registration_id)
            .ok_or_else(|| RegistryError::not_found(&input.registration_id))?;

        registration.kind = input.to_type;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
