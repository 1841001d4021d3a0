use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};

use crate::{
    builder::{BagBuilder, BagOptions, CollisionPolicy},
    errors::{RegisterError, ResolveError, StashError},
    injectable::{Factory, Registration},
    resolver::construct,
    types::Instance,
};

/// A computation of a dependency which has been started
pub type Pending = BoxFuture<'static, Result<Instance, ResolveError>>;
/// A one-shot computation - every clone observes the same result
pub type Settled = Shared<Pending>;

/// The registry of named dependencies
///
/// Cheap to clone, all clones share the same entries.
#[derive(Clone)]
pub struct Bag(Arc<BagInner>);
struct BagInner {
    options: BagOptions,
    entries: Mutex<HashMap<String, Entry>>,
    /// Entries put aside by [Bag::stash]
    stash: Mutex<Option<HashMap<String, Entry>>>,
}

/// What the bag holds for a name
#[derive(Clone)]
pub enum Entry {
    /// A raw value, passed through as is
    Constant(Instance),
    /// Computes the value when used
    Provider(Provider),
    /// A one-shot provider which has been used
    Settled(Settled),
}
impl Entry {
    fn holds(&self, one_shot: &Arc<OneShot>) -> bool {
        matches!(
            self,
            Entry::Provider(Provider {
                kind: ProviderKind::One(held),
                ..
            }) if Arc::ptr_eq(held, one_shot)
        )
    }

    fn state(&self) -> &'static str {
        match self {
            Entry::Constant(_) => "constant",
            Entry::Provider(provider) if provider.is_one_shot() => "one",
            Entry::Provider(_) => "each",
            Entry::Settled(_) => "settled",
        }
    }
}
impl Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entry::Constant(instance) => f.debug_tuple("Constant").field(instance).finish(),
            Entry::Provider(provider) => f.debug_tuple("Provider").field(provider).finish(),
            Entry::Settled(_) => f.write_str("Settled"),
        }
    }
}

/// Zero argument function producing a dependency
#[derive(Clone)]
pub struct Provider {
    name: Arc<str>,
    kind: ProviderKind,
}
#[derive(Clone)]
enum ProviderKind {
    /// Recomputed on every use
    Each(Factory),
    /// Computed on first use, then replaced by its result
    One(Arc<OneShot>),
}
struct OneShot {
    factory: Factory,
    settled: OnceLock<Settled>,
}
impl Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let policy = if self.is_one_shot() { "one" } else { "each" };
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("policy", &policy)
            .finish()
    }
}

impl Provider {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_one_shot(&self) -> bool {
        matches!(self.kind, ProviderKind::One(_))
    }

    /// Starts the computation
    ///
    /// A one-shot provider computes at most once, no matter how often or from how many
    /// threads it is invoked. The first invocation also replaces its bag entry with the result.
    pub(crate) fn invoke(&self, bag: &Bag) -> Pending {
        match &self.kind {
            ProviderKind::Each(factory) => construct(bag, &self.name, factory),
            ProviderKind::One(one_shot) => {
                let mut first = false;
                let settled = one_shot
                    .settled
                    .get_or_init(|| {
                        first = true;
                        construct(bag, &self.name, &one_shot.factory).shared()
                    })
                    .clone();

                if first {
                    bag.settle(&self.name, one_shot, settled.clone());
                }

                settled.boxed()
            }
        }
    }
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}
impl Debug for Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = lock(&self.0.entries);
        let mut names: Vec<_> = entries.keys().collect();
        names.sort();

        let mut map = f.debug_struct("Bag");
        for name in names {
            map.field(name, &entries[name].state());
        }
        map.finish()
    }
}

impl Bag {
    pub fn new() -> Self {
        Self::with_options(BagOptions::default())
    }

    pub fn builder() -> BagBuilder {
        BagBuilder::new()
    }

    pub(crate) fn with_options(options: BagOptions) -> Self {
        Bag(Arc::new(BagInner {
            options,
            entries: Mutex::new(HashMap::new()),
            stash: Mutex::new(None),
        }))
    }

    pub fn options(&self) -> BagOptions {
        self.0.options
    }

    /// Registers a dependency computed once, the first time it is used
    ///
    /// Constants are stored as is.
    ///
    /// A provider must not depend on itself, directly or through other `one`
    /// providers, unless it asks for `lazy_` of itself. Cycles are not detected:
    /// the first use re-enters the provider's own initialization and hangs.
    pub fn one(
        &self,
        name: impl Into<String>,
        value: impl Into<Registration>,
    ) -> Result<(), RegisterError> {
        let name = name.into();
        let entry = match value.into() {
            Registration::Constant(instance) => Entry::Constant(instance),
            Registration::Factory(factory) => Entry::Provider(Provider {
                name: name.as_str().into(),
                kind: ProviderKind::One(Arc::new(OneShot {
                    factory,
                    settled: OnceLock::new(),
                })),
            }),
        };

        self.insert(name, entry)
    }

    /// Registers a dependency recomputed every time it is used
    ///
    /// Fails for constants, they can't be recomputed.
    pub fn each(
        &self,
        name: impl Into<String>,
        value: impl Into<Registration>,
    ) -> Result<(), RegisterError> {
        let name = name.into();
        let Registration::Factory(factory) = value.into() else {
            return Err(RegisterError::NotInjectable(name));
        };

        let provider = Provider {
            name: name.as_str().into(),
            kind: ProviderKind::Each(factory),
        };
        self.insert(name, Entry::Provider(provider))
    }

    /// Current entry for a name, as is
    pub fn entry(&self, name: &str) -> Option<Entry> {
        lock(&self.0.entries).get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.0.entries).contains_key(name)
    }

    pub fn len(&self) -> usize {
        lock(&self.0.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.0.entries).is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = lock(&self.0.entries).keys().cloned().collect();
        names.sort();
        names
    }

    fn insert(&self, name: String, entry: Entry) -> Result<(), RegisterError> {
        let mut entries = lock(&self.0.entries);
        if entries.contains_key(&name) {
            match self.0.options.on_collision {
                CollisionPolicy::Warn => tracing::warn!("Bag already contains a '{name}'"),
                CollisionPolicy::Reject => return Err(RegisterError::AlreadyRegistered(name)),
            }
        }

        tracing::debug!("Registered '{name}' as {}", entry.state());
        entries.insert(name, entry);
        Ok(())
    }

    /// Replaces a one-shot provider with its computation
    ///
    /// Only if the entry still is that provider, a newer registration wins.
    fn settle(&self, name: &str, one_shot: &Arc<OneShot>, settled: Settled) {
        let mut entries = lock(&self.0.entries);
        match entries.get_mut(name) {
            Some(entry) if entry.holds(one_shot) => {
                tracing::debug!("Settled '{name}'");
                *entry = Entry::Settled(settled);
            }
            _ => tracing::debug!("'{name}' was replaced before it settled"),
        }
    }
}

// Test isolation
impl Bag {
    /// Moves all entries aside, leaving an empty bag for test registrations
    ///
    /// Stashing again discards the previous stash.
    pub fn stash(&self) {
        let mut entries = lock(&self.0.entries);
        let stashed = std::mem::take(&mut *entries);
        tracing::debug!("Stashed {} dependencies", stashed.len());

        if lock(&self.0.stash).replace(stashed).is_some() {
            tracing::debug!("Discarded the previous stash");
        }
    }

    /// Puts stashed entries back, they win over entries of the same name
    pub fn restore(&self) -> Result<(), StashError> {
        let stashed = lock(&self.0.stash).take().ok_or(StashError::NotStashed)?;
        tracing::debug!("Restoring {} dependencies", stashed.len());

        lock(&self.0.entries).extend(stashed);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, fmt};

    use futures::executor::block_on;
    use tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    };
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer,
    };

    use super::*;
    use crate::injectable::{constant, inject};

    fn answer() -> Registration {
        inject(&[], |_| async { Ok::<_, Infallible>(42_u32) }).into()
    }

    /// Collects the messages of WARN events
    #[derive(Clone, Default)]
    struct Warnings(Arc<Mutex<Vec<String>>>);
    impl Warnings {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }
    impl<S: Subscriber> Layer<S> for Warnings {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                let mut message = Message(String::new());
                event.record(&mut message);
                self.0.lock().unwrap().push(message.0);
            }
        }
    }

    struct Message(String);
    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    #[test]
    fn constant_is_stored_as_is() {
        let bag = Bag::new();
        bag.one("foo", constant(42_u32)).unwrap();
        let Some(Entry::Constant(instance)) = bag.entry("foo") else {
            panic!("expected a constant");
        };
        assert_eq!(*instance.downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn each_rejects_constants() {
        let bag = Bag::new();
        let error = bag.each("foo", constant(42_u32)).unwrap_err();
        assert!(matches!(error, RegisterError::NotInjectable(name) if name == "foo"));
        assert!(bag.is_empty());
    }

    #[test]
    fn overwrite_is_allowed_by_default() {
        let bag = Bag::new();
        bag.one("foo", constant(1_u32)).unwrap();
        bag.one("foo", constant(2_u32)).unwrap();
        let Some(Entry::Constant(instance)) = bag.entry("foo") else {
            panic!("expected a constant");
        };
        assert_eq!(*instance.downcast::<u32>().unwrap(), 2);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn collisions_are_warned_about() {
        let warnings = Warnings::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());
        let bag = Bag::new();

        tracing::subscriber::with_default(subscriber, || {
            bag.one("foo", constant(1_u32)).unwrap();
            assert!(warnings.take().is_empty());
            bag.one("foo", answer()).unwrap();
            assert_eq!(warnings.take(), ["Bag already contains a 'foo'"]);

            bag.each("bar", answer()).unwrap();
            assert!(warnings.take().is_empty());
            bag.each("bar", answer()).unwrap();
            assert_eq!(warnings.take(), ["Bag already contains a 'bar'"]);
        });
    }

    #[test]
    fn one_shot_settles_on_first_invoke() {
        let bag = Bag::new();
        bag.one("foo", answer()).unwrap();
        let Some(Entry::Provider(provider)) = bag.entry("foo") else {
            panic!("expected a provider");
        };
        assert!(provider.is_one_shot());

        let first = block_on(provider.invoke(&bag)).unwrap();
        assert!(matches!(bag.entry("foo"), Some(Entry::Settled(_))));

        let second = block_on(provider.invoke(&bag)).unwrap();
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn newer_registration_is_not_settled_over() {
        let bag = Bag::new();
        bag.one("foo", answer()).unwrap();
        let Some(Entry::Provider(provider)) = bag.entry("foo") else {
            panic!("expected a provider");
        };
        bag.one("foo", constant(7_u32)).unwrap();

        block_on(provider.invoke(&bag)).unwrap();
        assert!(matches!(bag.entry("foo"), Some(Entry::Constant(_))));
    }

    #[test]
    fn each_stays_a_provider() {
        let bag = Bag::new();
        bag.each("foo", answer()).unwrap();
        let Some(Entry::Provider(provider)) = bag.entry("foo") else {
            panic!("expected a provider");
        };
        assert!(!provider.is_one_shot());

        let first = block_on(provider.invoke(&bag)).unwrap();
        let second = block_on(provider.invoke(&bag)).unwrap();
        assert!(!first.ptr_eq(&second));
        assert!(matches!(bag.entry("foo"), Some(Entry::Provider(_))));
    }

    #[test]
    fn stash_and_restore() {
        let bag = Bag::new();
        bag.one("foo", constant(1_u32)).unwrap();
        bag.one("bar", answer()).unwrap();

        bag.stash();
        assert!(bag.is_empty());
        bag.one("test_only", constant(3_u32)).unwrap();
        bag.one("foo", constant(4_u32)).unwrap();

        bag.restore().unwrap();
        assert_eq!(bag.names(), ["bar", "foo", "test_only"]);
        let Some(Entry::Constant(foo)) = bag.entry("foo") else {
            panic!("expected a constant");
        };
        assert_eq!(*foo.downcast::<u32>().unwrap(), 1);
    }

    #[test]
    fn restore_needs_a_stash() {
        let bag = Bag::new();
        assert_eq!(bag.restore().unwrap_err(), StashError::NotStashed);

        bag.stash();
        bag.restore().unwrap();
        assert_eq!(bag.restore().unwrap_err(), StashError::NotStashed);
    }

    #[test]
    fn stashing_twice_discards_the_first_stash() {
        let bag = Bag::new();
        bag.one("foo", constant(1_u32)).unwrap();
        bag.stash();
        bag.stash();
        bag.restore().unwrap();
        assert!(!bag.contains("foo"));
    }

    #[test]
    fn debug_lists_states() {
        let bag = Bag::new();
        bag.one("a", constant(1_u32)).unwrap();
        bag.one("b", answer()).unwrap();
        bag.each("c", answer()).unwrap();
        assert_eq!(
            format!("{bag:?}"),
            r#"Bag { a: "constant", b: "one", c: "each" }"#
        );
    }
}
