use std::{fmt::Debug, future::Future, sync::Arc};

use futures::{future, FutureExt};

use crate::{
    bag::{Bag, Pending, Provider},
    dependency::Dependency,
    errors::ResolveError,
    resolver::{arc::extract, lagging, FromResolved, Resolved},
    types::{Instance, Storable},
};

/// Lazily resolved dependency
///
/// Nothing is computed until [Lazy::resolve] or [Lazy::get] is called.
/// Each call invokes the provider again, so a lazy `each` dependency is recomputed
/// per call while a lazy `one` dependency is computed once and then shared.
#[derive(Clone)]
pub struct Lazy {
    name: Arc<str>,
    inner: LazyInner,
}
#[derive(Clone)]
enum LazyInner {
    Deferred {
        bag: Bag,
        provider: Provider,
        lags: bool,
    },
    /// The entry was not a provider, there is nothing to defer
    Ready(Instance),
}
impl Debug for Lazy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.is_deferred() {
            "deferred"
        } else {
            "ready"
        };
        f.debug_tuple("Lazy").field(&self.name).field(&state).finish()
    }
}

impl Lazy {
    pub(crate) fn deferred(bag: Bag, provider: Provider, lags: bool) -> Self {
        Lazy {
            name: provider.name().into(),
            inner: LazyInner::Deferred {
                bag,
                provider,
                lags,
            },
        }
    }

    pub(crate) fn ready(name: &str, instance: Instance) -> Self {
        Lazy {
            name: name.into(),
            inner: LazyInner::Ready(instance),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.inner, LazyInner::Deferred { .. })
    }

    /// Invokes the provider now and returns its computation
    pub fn resolve(&self) -> Pending {
        match &self.inner {
            LazyInner::Deferred {
                bag,
                provider,
                lags,
            } => {
                let pending = provider.invoke(bag);
                if *lags {
                    lagging(self.name.to_string(), pending)
                } else {
                    pending
                }
            }
            LazyInner::Ready(instance) => future::ok(instance.clone()).boxed(),
        }
    }

    /// Invokes the provider now and waits for a `T`
    ///
    /// A rejected lagged dependency fails with the reason it was rejected.
    pub fn get<T: Storable>(&self) -> impl Future<Output = Result<Arc<T>, ResolveError>> {
        let pending = self.resolve();
        let name = self.name.clone();

        async move {
            let instance = pending.await?;
            extract(&name, &instance)
        }
    }
}

impl FromResolved for Lazy {
    fn from_resolved(dependency: &Dependency, resolved: &Resolved) -> Result<Self, ResolveError> {
        match resolved {
            Resolved::Lazy(lazy) => Ok(lazy.clone()),
            Resolved::Value(instance) => Ok(Lazy::ready(&dependency.name, instance.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::executor::block_on;

    use super::*;
    use crate::injectable::inject;

    #[test]
    fn computes_only_when_asked() {
        let bag = Bag::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        bag.each(
            "foo",
            inject(&[], move |_| {
                let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok::<_, ResolveError>(call) }
            }),
        )
        .unwrap();

        let Some(crate::bag::Entry::Provider(provider)) = bag.entry("foo") else {
            panic!("expected a provider");
        };
        let lazy = Lazy::deferred(bag.clone(), provider, false);
        assert!(lazy.is_deferred());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(*block_on(lazy.get::<usize>()).unwrap(), 1);
        assert_eq!(*block_on(lazy.get::<usize>()).unwrap(), 2);
    }

    #[test]
    fn ready_values_resolve_immediately() {
        let lazy = Lazy::ready("foo", Instance::new(3_u8));
        assert!(!lazy.is_deferred());
        assert_eq!(*block_on(lazy.get::<u8>()).unwrap(), 3);
        assert_eq!(format!("{lazy:?}"), r#"Lazy("foo", "ready")"#);
    }
}
