//! In-memory storage backend and a copy/sync pipeline over it
//!
//! Every location is a [`MemoryContainer`] holding objects in a [`PathTrie`].
//! Containers are created during the real pass only; discovery records the
//! chosen [`Location`] as custom state and never touches a container.
//!
//! Remote containers live under a shared account looked up in the global
//! [`AccountRegistry`]. Locations whose account kind is not registered are
//! not offered.

use e2e_scenario::{
    fixed_step, Account, AccountKind, AccountRegistry, Asserter, AsserterExt, ChoiceStep, Deletable, Discovery,
    Equal, FnStep, MockedVariation, Resource, ResourceError, ScenarioState, ScenarioStep, ScenarioVariation,
    StepError, StepFactory, StepResult,
};
use e2e_trie::PathTrie;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const SOURCE: &str = "source";
pub const DESTINATION: &str = "destination";
pub const TRANSFER_KEY: &str = "transfer";
/// Account segment of local directories
pub const LOCAL_ACCOUNT: &str = "local";

/// Where a container lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Local,
    Blob,
    File,
    BlobFs,
}

impl Location {
    pub const ALL: [Location; 4] = [Location::Local, Location::Blob, Location::File, Location::BlobFs];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Blob => "Blob",
            Self::File => "File",
            Self::BlobFs => "BlobFS",
        }
    }

    pub fn is_remote(self) -> bool {
        self != Self::Local
    }

    /// Kind of shared account a remote location needs
    pub fn account_kind(self) -> Option<AccountKind> {
        match self {
            Self::Local => None,
            Self::Blob | Self::File => Some(AccountKind::Standard),
            Self::BlobFs => Some(AccountKind::HierarchicalNamespace),
        }
    }

    /// Registered account backing this location, if it needs one
    pub fn account(self) -> Option<Arc<Account>> {
        let kind = self.account_kind()?;
        AccountRegistry::global()?.first_of_kind(kind)
    }

    fn is_available(self) -> bool {
        !self.is_remote() || self.account().is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    pub body: Vec<u8>,
}

/// A container (or local directory) backed by memory
#[derive(Debug)]
pub struct MemoryContainer {
    location: Location,
    account: String,
    name: String,
    objects: RwLock<PathTrie<MemoryObject>>,
    deleted: AtomicBool,
}

impl MemoryContainer {
    pub fn new(location: Location, account: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location,
            account: account.into(),
            name: name.into(),
            objects: RwLock::new(PathTrie::new('/')),
            deleted: AtomicBool::new(false),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> Result<(), ResourceError> {
        if self.is_deleted() {
            return Err(ResourceError::NotFound { path: self.canon() });
        }
        Ok(())
    }

    fn object_path(&self, path: &str) -> String {
        format!("{}/{path}", self.canon())
    }

    /// Write an object, replacing any existing one
    pub fn put(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<(), ResourceError> {
        self.ensure_live()?;
        self.objects.write().insert(path, MemoryObject { body: body.into() });
        Ok(())
    }

    /// Write an object that must not exist yet
    pub fn create(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<(), ResourceError> {
        self.ensure_live()?;
        let mut objects = self.objects.write();
        if objects.contains(path) {
            return Err(ResourceError::AlreadyExists {
                path: self.object_path(path),
            });
        }
        objects.insert(path, MemoryObject { body: body.into() });
        Ok(())
    }

    pub fn get(&self, path: &str) -> Result<MemoryObject, ResourceError> {
        self.ensure_live()?;
        self.objects
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound {
                path: self.object_path(path),
            })
    }

    pub fn remove(&self, path: &str) -> Result<MemoryObject, ResourceError> {
        self.ensure_live()?;
        self.objects.write().remove(path).ok_or_else(|| ResourceError::NotFound {
            path: self.object_path(path),
        })
    }

    /// Object paths and bodies in path order
    pub fn list(&self) -> Result<Vec<(String, MemoryObject)>, ResourceError> {
        self.ensure_live()?;
        Ok(self
            .objects
            .read()
            .entries()
            .into_iter()
            .map(|(path, object)| (path, object.clone()))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl Resource for MemoryContainer {
    fn canon(&self) -> String {
        format!("{}/{}", self.account, self.name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_deletable(&self) -> Option<&dyn Deletable> {
        Some(self)
    }
}

impl Deletable for MemoryContainer {
    fn delete(&self) -> Result<(), ResourceError> {
        if self.deleted.swap(true, Ordering::SeqCst) {
            return Err(ResourceError::NotFound { path: self.canon() });
        }
        *self.objects.write() = PathTrie::new('/');
        tracing::debug!(canon = %self.canon(), "deleted memory container");
        Ok(())
    }
}

fn location_key(role: &str) -> String {
    format!("{role}_location")
}

/// Choose where `role` lives, then create the container for real
#[derive(Debug, Clone)]
pub struct ResolveLocation {
    role: &'static str,
    options: Vec<Location>,
}

impl ResolveLocation {
    pub fn source() -> Self {
        Self::source_from(Location::ALL)
    }

    pub fn source_from(options: impl IntoIterator<Item = Location>) -> Self {
        Self {
            role: SOURCE,
            options: options.into_iter().collect(),
        }
    }

    /// Destination choices; `Local` is never offered after a `Local` source
    pub fn destination() -> Self {
        Self::destination_from(Location::ALL)
    }

    pub fn destination_from(options: impl IntoIterator<Item = Location>) -> Self {
        Self {
            role: DESTINATION,
            options: options.into_iter().collect(),
        }
    }
}

impl ScenarioStep for ResolveLocation {
    fn name(&self) -> &str {
        self.role
    }

    fn mock_variations(&self, state: &ScenarioState) -> Discovery {
        let local_source =
            self.role == DESTINATION && state.custom::<Location>(&location_key(SOURCE)) == Some(&Location::Local);

        let variations: Vec<_> = self
            .options
            .iter()
            .filter(|location| !(local_source && **location == Location::Local))
            .filter(|location| {
                let available = location.is_available();
                if !available {
                    tracing::debug!(role = self.role, %location, "no registered account, location not offered");
                }
                available
            })
            .map(|location| {
                let next = state.clone().with_custom(location_key(self.role), *location);
                MockedVariation::new(ScenarioVariation::new(location.as_str()), next)
            })
            .collect();

        if variations.is_empty() && local_source {
            return Discovery::impossible("local to local transfers are not supported");
        }
        variations.into()
    }

    fn run(&self, asserter: &mut dyn Asserter, mut state: ScenarioState, variation: &ScenarioVariation) -> StepResult {
        let Some(location) = self.options.iter().copied().find(|l| l.as_str() == variation.name()) else {
            return Err(asserter.error(&format!("{} cannot be placed at {}", self.role, variation.name())));
        };

        let account = match location.account_kind() {
            None => LOCAL_ACCOUNT.to_string(),
            Some(kind) => match location.account() {
                Some(account) => {
                    asserter.track_resource(account.clone());
                    account.name().to_string()
                }
                None => return Err(asserter.skip(&format!("no {kind} account registered for {location}"))),
            },
        };
        let container = Arc::new(MemoryContainer::new(location, account, format!("{}-{}", self.role, asserter.uuid())));

        asserter.log(&format!("created {} at {}", self.role, container.canon()));
        asserter.track_resource(container.clone());
        state.set_custom(location_key(self.role), location);
        state.set_resource(self.role, container);
        Ok(state)
    }
}

fn container<'a>(asserter: &mut dyn Asserter, state: &'a ScenarioState, role: &str) -> Result<&'a MemoryContainer, StepError> {
    match state.resource_as::<MemoryContainer>(role) {
        Some(container) => Ok(container),
        None => Err(asserter.error(&format!("no {role} container in state"))),
    }
}

/// Fill the source with fixed objects
pub fn populate_source(objects: Vec<(String, Vec<u8>)>) -> StepFactory {
    fixed_step(FnStep::new("populate").with_run(move |asserter, state, _| {
        let source = container(asserter, &state, SOURCE)?;
        for (path, body) in &objects {
            asserter.no_error(&format!("create {path}"), source.create(path, body.clone()))?;
        }
        asserter.log(&format!("populated {} objects", objects.len()));
        Ok(state)
    }))
}

fn transfer(asserter: &mut dyn Asserter, state: ScenarioState, sync: bool) -> StepResult {
    let source = container(asserter, &state, SOURCE)?;
    let destination = container(asserter, &state, DESTINATION)?;

    let objects = asserter.no_error("list source", source.list())?;
    for (path, object) in &objects {
        asserter.no_error(&format!("copy {path}"), destination.put(path, object.body.clone()))?;
    }

    if sync {
        let existing = asserter.no_error("list destination", destination.list())?;
        for (path, _) in existing {
            if !objects.iter().any(|(p, _)| *p == path) {
                asserter.no_error(&format!("delete extra {path}"), destination.remove(&path))?;
            }
        }
    }

    asserter.log(&format!("transferred {} objects", objects.len()));
    Ok(state)
}

/// Copy or sync everything from source to destination
pub fn transfer_step() -> StepFactory {
    fixed_step(TransferStep {
        choice: ChoiceStep::labels(TRANSFER_KEY, ["Copy", "Sync"]),
    })
}

#[derive(Debug, Clone)]
struct TransferStep {
    choice: ChoiceStep<String>,
}

impl ScenarioStep for TransferStep {
    fn name(&self) -> &str {
        TRANSFER_KEY
    }

    fn mock_variations(&self, state: &ScenarioState) -> Discovery {
        self.choice.mock_variations(state)
    }

    fn run(&self, asserter: &mut dyn Asserter, state: ScenarioState, variation: &ScenarioVariation) -> StepResult {
        let state = self.choice.run(asserter, state, variation)?;
        let sync = variation.name() == "Sync";
        transfer(asserter, state, sync)
    }
}

/// Destination holds exactly the source objects
pub fn validate_destination() -> StepFactory {
    fixed_step(FnStep::new("validate").with_run(|asserter, state, _| {
        let source = container(asserter, &state, SOURCE)?;
        let destination = container(asserter, &state, DESTINATION)?;

        let expected = asserter.no_error("list source", source.list())?;
        let actual = asserter.no_error("list destination", destination.list())?;
        asserter.assert("destination matches source", &Equal::new(expected, actual));
        Ok(state)
    }))
}

pub fn sample_objects() -> Vec<(String, Vec<u8>)> {
    vec![
        ("root.txt".to_string(), b"root".to_vec()),
        ("folder/a.txt".to_string(), b"alpha".to_vec()),
        ("folder/nested/b.bin".to_string(), vec![0, 1, 2, 3]),
    ]
}

/// Source x Destination x {Copy, Sync}, minus Local-to-Local
pub fn copy_pipeline() -> Vec<StepFactory> {
    vec![
        fixed_step(ResolveLocation::source()),
        fixed_step(ResolveLocation::destination()),
        populate_source(sample_objects()),
        transfer_step(),
        validate_destination(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{install_fixture_accounts, RecordingAsserter, HNS_ACCOUNT, STANDARD_ACCOUNT};
    use e2e_scenario::calculate_scenario_variations;
    use pretty_assertions::assert_eq;

    #[test]
    fn container_crud() {
        let c = MemoryContainer::new(Location::Blob, "blob-account", "c1");
        c.create("a/b.txt", "hello").unwrap();
        assert!(matches!(c.create("a/b.txt", "again"), Err(ResourceError::AlreadyExists { .. })));

        assert_eq!(c.get("a/b.txt").unwrap().body, b"hello");
        assert_eq!(c.list().unwrap().len(), 1);
        c.remove("a/b.txt").unwrap();
        assert!(c.is_empty());
        assert!(matches!(c.get("a/b.txt"), Err(ResourceError::NotFound { .. })));
    }

    #[test]
    fn delete_is_terminal() {
        let c = MemoryContainer::new(Location::File, "file-account", "share");
        c.put("x", "1").unwrap();

        c.delete().unwrap();
        assert!(c.is_deleted());
        assert!(c.put("y", "2").is_err());
        assert!(c.delete().is_err());
    }

    #[test]
    fn local_to_local_is_pruned() {
        let state = ScenarioState::new("Local").with_custom(location_key(SOURCE), Location::Local);

        let offered = ResolveLocation::destination().mock_variations(&state).into_variations();
        assert_eq!(offered.len(), 3);
        assert!(offered.iter().all(|m| m.variation.name() != "Local"));

        let only_local = ResolveLocation::destination_from([Location::Local]).mock_variations(&state);
        assert!(matches!(only_local, Discovery::Impossible(_)));
    }

    #[test]
    fn copy_pipeline_scenario_count() {
        install_fixture_accounts().unwrap();
        let found = calculate_scenario_variations(&copy_pipeline()).unwrap();
        assert_eq!(found.len(), 30);
        assert!(found.iter().all(|d| !d.to_string().starts_with("Local-Local")));
        assert_eq!(found[0].to_string(), "Local-Blob-Copy");
    }

    #[test]
    fn resolve_creates_container_under_registered_account() {
        install_fixture_accounts().unwrap();
        let mut asserter = RecordingAsserter::new("copy/Blob");
        let step = ResolveLocation::source();

        let state = step
            .run(&mut asserter, ScenarioState::new(""), &ScenarioVariation::new("BlobFS"))
            .unwrap();

        let created = state.resource_as::<MemoryContainer>(SOURCE).unwrap();
        assert_eq!(created.location(), Location::BlobFs);
        assert!(created.canon().starts_with(&format!("{HNS_ACCOUNT}/source-")));

        let tracked: Vec<String> = asserter.tracked.iter().map(|r| r.canon()).collect();
        assert_eq!(tracked, [HNS_ACCOUNT.to_string(), created.canon()]);
        assert!(asserter.tracked[0].as_deletable().is_none());
    }

    #[test]
    fn local_containers_need_no_account() {
        let mut asserter = RecordingAsserter::new("copy/Local");

        let state = ResolveLocation::source()
            .run(&mut asserter, ScenarioState::new(""), &ScenarioVariation::new("Local"))
            .unwrap();

        let created = state.resource_as::<MemoryContainer>(SOURCE).unwrap();
        assert!(created.canon().starts_with("local/source-"));
        assert_eq!(asserter.tracked.len(), 1);
    }

    #[test]
    fn discovery_reads_registry_without_changing_it() {
        let installed = install_fixture_accounts().unwrap();
        let before: Vec<String> = installed.names().into_iter().map(str::to_string).collect();

        let found = calculate_scenario_variations(&copy_pipeline()).unwrap();

        let after = AccountRegistry::global().unwrap();
        assert!(std::ptr::eq(installed, after));
        assert_eq!(after.names(), before);
        assert_eq!(after.get(STANDARD_ACCOUNT).unwrap().kind(), AccountKind::Standard);
        assert!(found.iter().any(|d| d.to_string().starts_with("BlobFS-")));
    }
}
