//! # Component Registry
//!
//! Named, typed, shared singletons (downstream clients, metrics sinks, caches)
//! owned by the server and injected into handlers at construction time.
//!
//! Components are registered during `init()` in declaration order, frozen for
//! the server's lifetime, and released in reverse order at shutdown. Lookup is
//! typed: the caller names the concrete component type and gets an `Arc<C>`
//! back, or a descriptive error when the name is unknown or the type does not
//! match.
//!
//! Thread safety of a component's own state is that component's contract; the
//! registry only guarantees read-only shared access after init.

use crate::error::{Result, RouterError};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A shared, named runtime singleton
///
/// Implementors provide a `release` hook called exactly once at shutdown.
/// The default hook does nothing.
pub trait Component: Any + Send + Sync {
    /// Release any resources held by this component
    ///
    /// Failures are logged by the registry and never abort shutdown.
    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// One registered component, viewable both as its concrete type and as
/// a release hook
struct Registered {
    instance: Arc<dyn Any + Send + Sync>,
    hook: Arc<dyn Component>,
}

/// Registry of named shared components
pub struct ComponentRegistry {
    entries: HashMap<String, Registered>,
    /// Declaration order, used in reverse for release
    order: Vec<String>,
    released: AtomicBool,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            released: AtomicBool::new(false),
        }
    }

    /// Register a component under a unique name
    ///
    /// Each name may be registered exactly once; a second registration under
    /// the same name is a fatal init-time error.
    pub fn register<C: Component>(&mut self, name: impl Into<String>, component: C) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RouterError::DuplicateComponent(name));
        }

        let instance = Arc::new(component);
        self.entries.insert(
            name.clone(),
            Registered {
                instance: instance.clone(),
                hook: instance,
            },
        );
        info!(component = %name, "component registered");
        self.order.push(name);
        Ok(())
    }

    /// Look up a component by name and concrete type
    pub fn lookup<C: Component>(&self, name: &str) -> Result<Arc<C>> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RouterError::ComponentNotFound(name.to_string()))?;

        entry
            .instance
            .clone()
            .downcast::<C>()
            .map_err(|_| RouterError::ComponentTypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<C>(),
            })
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every component, best-effort
    ///
    /// Runs in reverse declaration order. A failing release hook is logged and
    /// the remaining components are still released. Subsequent calls are no-ops.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        for name in self.order.iter().rev() {
            let Some(entry) = self.entries.get(name) else {
                continue;
            };
            match entry.hook.release() {
                Ok(()) => debug!(component = %name, "component released"),
                Err(e) => error!(component = %name, error = %e, "component release failed"),
            }
        }
    }
}
