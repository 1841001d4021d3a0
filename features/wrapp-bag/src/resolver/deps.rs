use std::sync::Arc;

use crate::{
    dependency::Dependency,
    errors::ResolveError,
    resolver::{FromResolved, Resolved},
    types::{Instance, Storable},
};

/// The resolved dependencies of one invocation, in declaration order
///
/// Handed to every injectable. Values are taken out by position or by name,
/// as any type implementing [FromResolved].
#[derive(Clone, Debug)]
pub struct Deps {
    dependencies: Arc<[Dependency]>,
    context: Option<Instance>,
    values: Vec<Resolved>,
}

impl Deps {
    pub(crate) fn new(
        dependencies: Arc<[Dependency]>,
        context: Option<Instance>,
        values: Vec<Resolved>,
    ) -> Self {
        debug_assert_eq!(dependencies.len(), values.len());
        Deps {
            dependencies,
            context,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Takes the dependency declared at `index`
    pub fn get<R: FromResolved>(&self, index: usize) -> Result<R, ResolveError> {
        let dependency = self
            .dependencies
            .get(index)
            .ok_or(ResolveError::OutOfRange(index))?;
        let resolved = self
            .values
            .get(index)
            .ok_or(ResolveError::OutOfRange(index))?;

        R::from_resolved(dependency, resolved)
    }

    /// Takes the first dependency declared with `name`, modifiers are ignored
    pub fn named<R: FromResolved>(&self, name: &str) -> Result<R, ResolveError> {
        let wanted = Dependency::parse(name);
        let index = self
            .dependencies
            .iter()
            .position(|dependency| dependency.name == wanted.name)
            .ok_or(ResolveError::Undeclared(wanted.name))?;

        self.get(index)
    }

    pub fn resolved(&self, index: usize) -> Option<&Resolved> {
        self.values.get(index)
    }

    /// The context bound to the injectable, if it is a `T`
    pub fn context<T: Storable>(&self) -> Option<Arc<T>> {
        self.context.as_ref()?.downcast().ok()
    }

    pub fn into_values(self) -> Vec<Resolved> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps() -> Deps {
        Deps::new(
            ["foo", "lags_bar"].map(Dependency::parse).into(),
            Some(Instance::new("ctx")),
            vec![
                Resolved::Value(Instance::new(1_u32)),
                Resolved::Value(Instance::new("two".to_string())),
            ],
        )
    }

    #[test]
    fn by_position_and_name() {
        let deps = deps();
        assert_eq!(deps.len(), 2);
        assert_eq!(*deps.get::<Arc<u32>>(0).unwrap(), 1);
        assert_eq!(*deps.named::<Arc<String>>("bar").unwrap(), "two");
        assert_eq!(*deps.named::<Arc<String>>("lags_bar").unwrap(), "two");
    }

    #[test]
    fn misuse_is_reported() {
        let deps = deps();
        assert!(matches!(
            deps.get::<Instance>(2),
            Err(ResolveError::OutOfRange(2))
        ));
        assert!(matches!(
            deps.named::<Instance>("baz"),
            Err(ResolveError::Undeclared(name)) if name == "baz"
        ));
        assert!(matches!(
            deps.get::<Arc<String>>(0),
            Err(ResolveError::DowncastFailed { actual_type: "u32", .. })
        ));
    }

    #[test]
    fn context_is_typed() {
        let deps = deps();
        assert_eq!(deps.context::<&str>().as_deref(), Some(&"ctx"));
        assert!(deps.context::<u32>().is_none());
    }
}
