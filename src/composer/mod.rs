//! Property source composition.
//!
//! The composer reads every generic context and backend entry and assembles the
//! results into a [`ConfigView`]. The optional [`LeaseRefresher`] keeps leased
//! sources of a composed view fresh afterwards.

mod compose;
mod fetcher;
mod flatten;
mod leasing;
mod view;

pub use compose::PropertySourceComposer;
pub use fetcher::{PropertyFetcher, VaultPropertyFetcher};
pub use flatten::flatten;
pub use leasing::LeaseRefresher;
pub use view::{ConfigView, PropertySource, SecretLease};
