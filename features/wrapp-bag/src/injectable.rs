use std::{future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    dependency::Dependency,
    resolver::{Deps, Resolved},
    types::{DynError, Instance, Storable},
};

/// A callable together with the dependencies it declares
///
/// The declared names are parsed once, here, and cached with the callable.
pub struct Injectable<F> {
    pub(crate) dependencies: Arc<[Dependency]>,
    pub(crate) context: Option<Instance>,
    pub(crate) func: F,
}

/// Declares `func` to depend on `names`, in order
///
/// ```
/// use wrapp_bag::{inject, Deps};
///
/// let greeter = inject(&["name", "lazy_lags_title"], |deps: Deps| async move {
///     deps.len()
/// });
/// assert_eq!(greeter.dependencies().len(), 2);
/// assert!(greeter.dependencies()[1].lazy);
/// ```
pub fn inject<F, Fut>(names: &[&str], func: F) -> Injectable<F>
where
    F: Fn(Deps) -> Fut,
{
    Injectable {
        dependencies: names.iter().map(|name| Dependency::parse(name)).collect(),
        context: None,
        func,
    }
}

impl<F> Injectable<F> {
    /// Binds a context, handed to the callable as [Deps::context]
    pub fn with_context<C: Storable>(mut self, context: C) -> Self {
        self.context = Some(Instance::new(context));
        self
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn context(&self) -> Option<&Instance> {
        self.context.as_ref()
    }

    pub(crate) fn call<Fut>(&self, values: Vec<Resolved>) -> Fut
    where
        F: Fn(Deps) -> Fut,
    {
        (self.func)(Deps::new(
            self.dependencies.clone(),
            self.context.clone(),
            values,
        ))
    }
}
impl<F: Clone> Clone for Injectable<F> {
    fn clone(&self) -> Self {
        Injectable {
            dependencies: self.dependencies.clone(),
            context: self.context.clone(),
            func: self.func.clone(),
        }
    }
}

pub(crate) type FactoryFn =
    dyn Fn(Deps) -> BoxFuture<'static, Result<Instance, DynError>> + Send + Sync;

/// An injectable with its product type erased, ready to live in the bag
#[derive(Clone)]
pub struct Factory {
    pub(crate) dependencies: Arc<[Dependency]>,
    pub(crate) context: Option<Instance>,
    pub(crate) func: Arc<FactoryFn>,
}
impl Factory {
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn call(
        &self,
        values: Vec<Resolved>,
    ) -> BoxFuture<'static, Result<Instance, DynError>> {
        (self.func)(Deps::new(
            self.dependencies.clone(),
            self.context.clone(),
            values,
        ))
    }
}

/// Anything that can be put in the bag
#[derive(Clone)]
pub enum Registration {
    /// Stored as is, never re-evaluated
    Constant(Instance),
    /// Computed from its own dependencies when used
    Factory(Factory),
}
impl Registration {
    pub fn is_injectable(&self) -> bool {
        matches!(self, Registration::Factory(_))
    }
}

/// Registers `value` as is
pub fn constant<T: Storable>(value: T) -> Registration {
    Registration::Constant(Instance::new(value))
}

impl From<Instance> for Registration {
    fn from(instance: Instance) -> Self {
        Registration::Constant(instance)
    }
}

impl<F, Fut, T, E> From<Injectable<F>> for Registration
where
    F: Fn(Deps) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Storable,
    E: Into<DynError>,
{
    fn from(injectable: Injectable<F>) -> Self {
        let Injectable {
            dependencies,
            context,
            func,
        } = injectable;

        let func: Arc<FactoryFn> = Arc::new(
            move |deps: Deps| -> BoxFuture<'static, Result<Instance, DynError>> {
                let product = func(deps);
                async move {
                    product
                        .await
                        .map(Instance::new)
                        .map_err(Into::<DynError>::into)
                }
                .boxed()
            },
        );

        Registration::Factory(Factory {
            dependencies,
            context,
            func,
        })
    }
}
