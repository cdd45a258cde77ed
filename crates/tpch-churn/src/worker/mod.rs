//! The two workload roles sharing a [`WindowCursor`].
//!
//! - [`Updater`] - repeatedly samples a live order key, reads its last line
//!   and bumps `l_quantity` by one.
//! - [`Inserter`] - streams rows from a [`LineImporter`] into the store and
//!   moves the window forward after every insert. At most one may run.
//!
//! Both expose a single-iteration `step` used by tests and a `run` loop that
//! repeats it until cancelled or until a collaborator fails.
//!
//! [`WindowCursor`]: crate::WindowCursor
//! [`LineImporter`]: crate::LineImporter

mod inserter;
#[cfg(test)]
mod tests;
mod updater;

pub use inserter::*;
pub use updater::*;
