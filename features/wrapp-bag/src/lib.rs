//! Wrapp Bag is a small async dependency injection container.
//!
//! Dependencies are registered by name in a [Bag], either as constants or as providers
//! computing their value asynchronously from their own dependencies.
//! Consumers declare what they need by name and get everything resolved concurrently.
//!
//! Wrapp Bag is split into the following parts:
//! 1. Bag: the registry, with `one` (computed once) and `each` (computed per use) providers
//! 2. Injectable: a callable together with the names of its dependencies
//! 3. Resolver: turns declared names into a bundle of values ([Deps])
//! 4. Invocation: `prepped`, `every`, `run` and `get` on the [Bag]
//!
//! A declared name may carry modifiers:
//! - `lazy_name` hands over a [Lazy] which computes `name` only when asked to
//! - `lags_name` never fails the bundle, a failure is handed over as a [Rejected] value
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use futures::executor::block_on;
//! use wrapp_bag::{constant, inject, Bag, Deps};
//!
//! let bag = Bag::new();
//! bag.one("host", constant("localhost")).unwrap();
//! bag.one(
//!     "url",
//!     inject(&["host"], |deps: Deps| async move {
//!         let host = deps.get::<Arc<&str>>(0)?;
//!         Ok::<_, wrapp_bag::ResolveError>(format!("http://{host}:8080"))
//!     }),
//! )
//! .unwrap();
//!
//! let url = block_on(bag.run(inject(&["url"], |deps: Deps| async move {
//!     deps.get::<Arc<String>>(0)
//! })))
//! .unwrap()
//! .unwrap();
//!
//! assert_eq!(*url, "http://localhost:8080");
//! ```

use std::sync::LazyLock;

pub mod bag;
pub mod builder;
pub mod dependency;
pub mod errors;
pub mod injectable;
pub mod invoke;
pub mod resolver;
pub mod types;

pub use bag::{Bag, Entry, Provider};
pub use builder::{BagBuilder, BagOptions, CollisionPolicy};
pub use dependency::Dependency;
pub use errors::{RegisterError, ResolveError, StashError};
pub use injectable::{constant, inject, Injectable, Registration};
pub use invoke::{Every, Prepped};
pub use resolver::{Deps, FromResolved, Lazy, Resolved};
pub use types::{DynError, Instance, Rejected, Storable, TypeInfo};

static GLOBAL_BAG: LazyLock<Bag> = LazyLock::new(Bag::new);

/// The process wide bag
///
/// Created empty on first access.
pub fn global() -> &'static Bag {
    &GLOBAL_BAG
}

/// Sandboxing of the global bag for tests
///
/// Fetch what the code under test needs, [stash](testing::stash) the bag,
/// register test doubles and [restore](testing::restore) afterwards.
pub mod testing {
    use crate::{errors::StashError, global};

    pub fn stash() {
        global().stash()
    }

    pub fn restore() -> Result<(), StashError> {
        global().restore()
    }
}
