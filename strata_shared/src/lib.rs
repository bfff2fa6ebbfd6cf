//! Utilities shared by all `strata` crates.
//!
//! Besides the [`DebugInfo`] machinery this crate re-exports the crates that
//! make up the common stack so that the other crates agree on their versions.

mod debug_info;

pub use debug_info::*;

pub use bitflags;
pub use derive_new;
pub use log;
pub use parking_lot;
pub use serde_json;
pub use serde_yaml;
pub use thiserror;
pub use uuid;

/// Name of the function this macro is called in
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}
