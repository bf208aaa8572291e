#![allow(dead_code, unused_imports)]

use cfg_if;

#[cfg(not(feature = "check-loom"))]
pub use std::*;

#[cfg(feature = "check-loom")]
pub use loom::*;

/// Run `f` with `loom::model` if compiled with `check-loom` feature.
pub fn model<F: Fn() + Sync + Send + 'static>(f: F) {
    let _ = env_logger::builder().is_test(true).try_init();

    cfg_if::cfg_if! {
        if #[cfg(feature = "check-loom")] {
            loom::model(f)
        } else {
            f()
        }
    }
}
