// src/drawer.rs

//! Drawer plugin contract and the name-keyed catalog of available drawers.
//!
//! The catalog is an explicit value built at startup and handed to whoever
//! needs to enumerate drawers; there is no global registration. Names are
//! kept in a `BTreeMap`, so instantiation always walks them in lexicographic
//! order and a drawer's left-to-right position on the bar is the same on
//! every run.

use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::canvas::CanvasView;
use crate::state::State;

/// A pluggable component that paints one slice of the bar.
pub trait Drawer: Send {
    /// Paints into `view`. The view is only valid for this call.
    fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()>;
}

/// Builds a drawer from the shared state.
pub type Constructor = fn(&State) -> Result<Box<dyn Drawer>>;

#[derive(Clone, Copy)]
pub struct Registration {
    /// Whether the drawer runs when the configuration does not name the
    /// drawers explicitly.
    pub enabled_by_default: bool,
    pub constructor: Constructor,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("drawer '{0}' is already registered")]
    Duplicate(String),
    #[error("unknown drawer '{name}' (available: {})", available.join(", "))]
    Unknown {
        name: String,
        available: Vec<String>,
    },
    #[error("drawer '{name}' failed to initialise")]
    Construct {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// An instantiated drawer together with the name it was registered under.
pub struct LoadedDrawer {
    name: String,
    drawer: Box<dyn Drawer>,
}

impl LoadedDrawer {
    pub fn new(name: impl Into<String>, drawer: Box<dyn Drawer>) -> Self {
        LoadedDrawer {
            name: name.into(),
            drawer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()> {
        self.drawer.draw(view)
    }
}

impl fmt::Debug for LoadedDrawer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedDrawer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Name-keyed catalog of drawer constructors.
#[derive(Default)]
pub struct DrawerRegistry {
    entries: BTreeMap<String, Registration>,
}

impl DrawerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the drawers bundled with the bar.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, registration) in crate::drawers::BUILTIN {
            // Bundled names are unique literals.
            registry.entries.insert(name.to_string(), *registration);
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        registration: Registration,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        debug!(
            "Registered drawer '{}' (enabled by default: {})",
            name, registration.enabled_by_default
        );
        self.entries.insert(name, registration);
        Ok(())
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Names of the drawers that will run for `state`, in instantiation order.
    pub fn selected_names(&self, state: &State) -> Result<Vec<&str>, RegistryError> {
        match &state.config.drawers.enabled {
            Some(wanted) => {
                if let Some(unknown) = wanted.iter().find(|n| !self.entries.contains_key(*n)) {
                    return Err(RegistryError::Unknown {
                        name: unknown.clone(),
                        available: self.names().map(str::to_string).collect(),
                    });
                }
                Ok(self
                    .names()
                    .filter(|name| wanted.iter().any(|w| w.as_str() == *name))
                    .collect())
            }
            None => Ok(self
                .entries
                .iter()
                .filter(|(_, reg)| reg.enabled_by_default)
                .map(|(name, _)| name.as_str())
                .collect()),
        }
    }

    /// Constructs the selected drawers in sorted-name order.
    ///
    /// The first constructor failure aborts the whole instantiation.
    pub fn instantiate(&self, state: &State) -> Result<Vec<LoadedDrawer>, RegistryError> {
        let names = self.selected_names(state)?;
        let mut drawers = Vec::with_capacity(names.len());
        for name in names {
            let registration = &self.entries[name];
            let drawer = (registration.constructor)(state).map_err(|source| {
                RegistryError::Construct {
                    name: name.to_string(),
                    source,
                }
            })?;
            debug!("Drawer '{}' constructed", name);
            drawers.push(LoadedDrawer::new(name, drawer));
        }
        info!(
            "Instantiated {} drawer(s): [{}]",
            drawers.len(),
            drawers
                .iter()
                .map(LoadedDrawer::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(drawers)
    }
}
