use crate::{bag::Bag, errors::RegisterError, injectable::Registration};

/// What happens when a name is registered twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Log a warning and overwrite the previous entry
    #[default]
    Warn,
    /// Refuse the registration with [RegisterError::AlreadyRegistered]
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BagOptions {
    pub on_collision: CollisionPolicy,
}

enum Policy {
    One,
    Each,
}

/// Configures a [Bag] and its initial dependencies
///
/// ```
/// use std::convert::Infallible;
/// use wrapp_bag::{constant, inject, Bag, CollisionPolicy};
///
/// let bag = Bag::builder()
///     .on_collision(CollisionPolicy::Reject)
///     .one("port", constant(8080_u16))
///     .each("request_id", inject(&[], |_| async { Ok::<_, Infallible>(7_u64) }))
///     .build()
///     .unwrap();
///
/// assert!(bag.one("port", constant(9090_u16)).is_err());
/// ```
pub struct BagBuilder {
    options: BagOptions,
    /// Registrations applied in order on build
    registrations: Vec<(String, Policy, Registration)>,
}
impl Default for BagBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BagBuilder {
    pub fn new() -> Self {
        BagBuilder {
            options: BagOptions::default(),
            registrations: Vec::new(),
        }
    }
}
impl BagBuilder {
    pub fn on_collision(mut self, policy: CollisionPolicy) -> Self {
        self.options.on_collision = policy;
        self
    }

    pub fn one(mut self, name: impl Into<String>, value: impl Into<Registration>) -> Self {
        self.registrations
            .push((name.into(), Policy::One, value.into()));
        self
    }

    pub fn each(mut self, name: impl Into<String>, value: impl Into<Registration>) -> Self {
        self.registrations
            .push((name.into(), Policy::Each, value.into()));
        self
    }

    pub fn build(self) -> Result<Bag, RegisterError> {
        tracing::debug!(
            "Building bag with {} dependencies",
            self.registrations.len()
        );

        let bag = Bag::with_options(self.options);
        for (name, policy, value) in self.registrations {
            match policy {
                Policy::One => bag.one(name, value)?,
                Policy::Each => bag.each(name, value)?,
            }
        }

        Ok(bag)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::injectable::{constant, inject};

    #[test]
    fn warns_by_default() {
        let bag = Bag::builder()
            .one("foo", constant(1_u32))
            .one("foo", constant(2_u32))
            .build()
            .unwrap();
        assert_eq!(bag.options().on_collision, CollisionPolicy::Warn);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn reject_policy_refuses_duplicates() {
        let result = Bag::builder()
            .on_collision(CollisionPolicy::Reject)
            .one("foo", constant(1_u32))
            .each("foo", inject(&[], |_| async { Ok::<_, Infallible>(2_u32) }))
            .build();
        assert!(matches!(result, Err(RegisterError::AlreadyRegistered(name)) if name == "foo"));
    }

    #[test]
    fn build_surfaces_invalid_registrations() {
        let result = Bag::builder().each("foo", constant(1_u32)).build();
        assert!(matches!(result, Err(RegisterError::NotInjectable(_))));
    }
}
