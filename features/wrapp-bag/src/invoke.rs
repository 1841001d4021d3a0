//! The ways of calling an injectable with its dependencies

use std::future::Future;

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};

use crate::{
    bag::Bag,
    dependency::Dependency,
    errors::ResolveError,
    injectable::Injectable,
    resolver::{resolve_all, Deps, Resolved},
};

type Bundle = Shared<BoxFuture<'static, Result<Vec<Resolved>, ResolveError>>>;

/// An injectable whose dependencies were resolved once, when it was prepared
///
/// Re-registering a dependency afterwards has no effect on later calls.
pub struct Prepped<F> {
    consumer: Injectable<F>,
    bundle: Bundle,
}
impl<F, Fut> Prepped<F>
where
    F: Fn(Deps) -> Fut,
    Fut: Future,
{
    pub async fn call(&self) -> Result<Fut::Output, ResolveError> {
        let values = self.bundle.clone().await?;
        Ok(self.consumer.call(values).await)
    }
}

/// An injectable whose dependencies are resolved again on every call
pub struct Every<F> {
    bag: Bag,
    consumer: Injectable<F>,
}
impl<F, Fut> Every<F>
where
    F: Fn(Deps) -> Fut,
    Fut: Future,
{
    pub fn call(&self) -> impl Future<Output = Result<Fut::Output, ResolveError>> + '_ {
        let resolving = resolve_all(&self.bag, self.consumer.dependencies());

        async move {
            let values = resolving.await?;
            Ok(self.consumer.call(values).await)
        }
    }
}

impl Bag {
    /// Resolves dependencies by name, without a consumer
    ///
    /// Names may carry the `lazy_`/`lags_` prefixes.
    pub fn get<I, S>(
        &self,
        names: I,
    ) -> impl Future<Output = Result<Deps, ResolveError>> + Send
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dependencies: std::sync::Arc<[Dependency]> = names
            .into_iter()
            .map(|name| Dependency::parse(name.as_ref()))
            .collect();
        let resolving = resolve_all(self, &dependencies);

        async move {
            let values = resolving.await?;
            Ok(Deps::new(dependencies, None, values))
        }
    }

    /// Resolves the consumer's dependencies now, once
    ///
    /// The bundle is driven as far as it gets before returning. Providers
    /// waiting on something else finish when the prepped consumer is called.
    pub fn prepped<F, Fut>(&self, consumer: Injectable<F>) -> Prepped<F>
    where
        F: Fn(Deps) -> Fut,
        Fut: Future,
    {
        let bundle = resolve_all(self, consumer.dependencies())
            .boxed()
            .shared();
        let _ = bundle.clone().now_or_never();

        Prepped { consumer, bundle }
    }

    /// Resolves the consumer's dependencies on each call
    pub fn every<F, Fut>(&self, consumer: Injectable<F>) -> Every<F>
    where
        F: Fn(Deps) -> Fut,
        Fut: Future,
    {
        Every {
            bag: self.clone(),
            consumer,
        }
    }

    /// Prepares the consumer and calls it right away
    pub fn run<F, Fut>(
        &self,
        consumer: Injectable<F>,
    ) -> impl Future<Output = Result<Fut::Output, ResolveError>>
    where
        F: Fn(Deps) -> Fut,
        Fut: Future,
    {
        let prepped = self.prepped(consumer);
        async move { prepped.call().await }
    }
}
