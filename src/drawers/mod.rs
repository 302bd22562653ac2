// src/drawers/mod.rs

//! Drawers bundled with the bar.

pub mod battery;
pub mod clock;
pub mod load;
mod paint;

use crate::drawer::Registration;

/// Static catalog consumed by `DrawerRegistry::builtin`.
pub(crate) const BUILTIN: &[(&str, Registration)] = &[
    (
        battery::NAME,
        Registration {
            enabled_by_default: false,
            constructor: battery::new,
        },
    ),
    (
        clock::NAME,
        Registration {
            enabled_by_default: true,
            constructor: clock::new,
        },
    ),
    (
        load::NAME,
        Registration {
            enabled_by_default: true,
            constructor: load::new,
        },
    ),
];
