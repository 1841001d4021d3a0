use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

use crate::errors::ResolveError;

/// All errors must be Send + Sync, they travel through shared futures
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// We assume that we are using a multithreaded async runtime
/// So anything stored in the bag needs to be Send + Sync + 'static
pub trait Storable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Storable for T {}

/// A type erased value held by the bag or produced by a provider
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub fn new<Value: Storable>(value: Value) -> Self {
        Instance {
            info: TypeInfo::of::<Value>(),
            instance: Arc::new(value),
        }
    }

    pub fn downcast<T: Storable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    pub fn is<T: Storable>(&self) -> bool {
        self.info.type_id == TypeId::of::<T>()
    }

    /// True if this value is a lagged dependency's failure turned into data
    pub fn is_rejected(&self) -> bool {
        self.is::<Rejected>()
    }

    pub fn rejection(&self) -> Option<Arc<Rejected>> {
        self.downcast::<Rejected>().ok()
    }

    /// Both instances point at the same allocation
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

/// Marker for a lagged dependency whose provider failed
///
/// A `lags_` dependency never fails the bundle. Its failure is handed to the
/// consumer as an [Instance] of this type instead, so the consumer can branch on it.
/// Only the resolver creates these.
#[derive(Debug)]
pub struct Rejected {
    pub(crate) dependency: String,
    pub(crate) reason: ResolveError,
}
impl Rejected {
    /// Name of the dependency which failed
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn reason(&self) -> &ResolveError {
        &self.reason
    }
}
impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' was rejected: {}", self.dependency, self.reason)
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}
