//! Turns declared dependencies into values from the bag

use std::sync::Arc;

use futures::{
    future::{self, BoxFuture, TryJoinAll},
    FutureExt, TryFutureExt,
};

use crate::{
    bag::{Bag, Entry, Pending},
    dependency::Dependency,
    errors::ResolveError,
    injectable::Factory,
    types::{Instance, Rejected},
};

pub mod arc;
pub mod deps;
pub mod lazy;

pub use deps::Deps;
pub use lazy::Lazy;

/// A single resolved dependency of a bundle
#[derive(Clone, Debug)]
pub enum Resolved {
    Value(Instance),
    /// A `lazy_` provider which has not been invoked
    Lazy(Lazy),
}

/// Allows typed access to resolved dependencies
pub trait FromResolved: Sized {
    fn from_resolved(dependency: &Dependency, resolved: &Resolved) -> Result<Self, ResolveError>;
}

/// Resolution of a whole bundle, in declaration order
pub(crate) type Resolving = TryJoinAll<BoxFuture<'static, Result<Resolved, ResolveError>>>;

/// Resolves all dependencies concurrently
///
/// Lookups and provider invocations happen right away, before anything is awaited.
/// Fails as soon as one dependency which is neither lazy nor lagged fails.
pub(crate) fn resolve_all(bag: &Bag, dependencies: &[Dependency]) -> Resolving {
    future::try_join_all(
        dependencies
            .iter()
            .map(|dependency| resolve_one(bag, dependency)),
    )
}

fn resolve_one(
    bag: &Bag,
    dependency: &Dependency,
) -> BoxFuture<'static, Result<Resolved, ResolveError>> {
    let name = &dependency.name;
    let Some(entry) = bag.entry(name) else {
        tracing::error!("Tried to resolve an unregistered dependency: '{name}'");
        return future::err(ResolveError::Missing(name.clone())).boxed();
    };

    match entry {
        // Modifiers only apply to providers
        Entry::Constant(instance) => future::ok(Resolved::Value(instance)).boxed(),
        Entry::Settled(settled) => settled.map_ok(Resolved::Value).boxed(),
        Entry::Provider(provider) => {
            if dependency.lazy {
                let lazy = Lazy::deferred(bag.clone(), provider, dependency.lags);
                return future::ok(Resolved::Lazy(lazy)).boxed();
            }

            let pending = provider.invoke(bag);
            let pending = if dependency.lags {
                lagging(name.clone(), pending)
            } else {
                pending
            };
            pending.map_ok(Resolved::Value).boxed()
        }
    }
}

/// Computes a provider's product from its own dependencies
///
/// The computation is driven as far as it gets right away, so the provider
/// body reads its state when resolution starts, not when first awaited.
pub(crate) fn construct(bag: &Bag, name: &str, factory: &Factory) -> Pending {
    let dependencies = resolve_all(bag, factory.dependencies());
    let factory = factory.clone();
    let name = name.to_string();

    let mut pending = async move {
        let values = dependencies.await?;
        factory
            .call(values)
            .await
            .map_err(|error| ResolveError::ProviderFailed {
                name,
                error: Arc::new(error),
            })
    }
    .boxed();

    match (&mut pending).now_or_never() {
        Some(result) => future::ready(result).boxed(),
        None => pending,
    }
}

/// A failure becomes a [Rejected] value
pub(crate) fn lagging(name: String, pending: Pending) -> Pending {
    async move {
        match pending.await {
            Ok(instance) => Ok(instance),
            Err(reason) => {
                tracing::debug!("Lagged dependency '{name}' was rejected: {reason}");
                Ok(Instance::new(Rejected {
                    dependency: name,
                    reason,
                }))
            }
        }
    }
    .boxed()
}
