use std::sync::Arc;

use crate::{
    dependency::Dependency,
    errors::ResolveError,
    resolver::{FromResolved, Resolved},
    types::{Instance, Rejected, Storable},
};

impl FromResolved for Instance {
    fn from_resolved(dependency: &Dependency, resolved: &Resolved) -> Result<Self, ResolveError> {
        match resolved {
            Resolved::Value(instance) => Ok(instance.clone()),
            Resolved::Lazy(_) => Err(ResolveError::Deferred(dependency.name.clone())),
        }
    }
}

/// A rejected lagged dependency fails with the reason it was rejected
impl<T: Storable> FromResolved for Arc<T> {
    fn from_resolved(dependency: &Dependency, resolved: &Resolved) -> Result<Self, ResolveError> {
        let instance = Instance::from_resolved(dependency, resolved)?;
        extract(&dependency.name, &instance)
    }
}

/// For `lags_` dependencies - the rejection is handed over as a value
impl<T: Storable> FromResolved for Result<Arc<T>, Arc<Rejected>> {
    fn from_resolved(dependency: &Dependency, resolved: &Resolved) -> Result<Self, ResolveError> {
        let instance = Instance::from_resolved(dependency, resolved)?;
        match instance.rejection() {
            Some(rejected) => Ok(Err(rejected)),
            None => downcast(&dependency.name, &instance).map(Ok),
        }
    }
}

pub(crate) fn extract<T: Storable>(
    name: &str,
    instance: &Instance,
) -> Result<Arc<T>, ResolveError> {
    if let Some(rejected) = instance.rejection() {
        return Err(rejected.reason().clone());
    }
    downcast(name, instance)
}

fn downcast<T: Storable>(name: &str, instance: &Instance) -> Result<Arc<T>, ResolveError> {
    instance
        .downcast()
        .map_err(|actual_type| ResolveError::DowncastFailed {
            name: name.to_string(),
            required_type: std::any::type_name::<T>(),
            actual_type,
        })
}
