//! Run targets and the registry that holds them.
//!
//! The registry only exposes lookup and iteration. Targets are constructed
//! by [`TargetPresets`]; asking the registry to create one directly fails.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Anything the registry can hold.
pub trait NamedTarget {
    /// Unique name within a registry.
    fn target_name(&self) -> &str;
}

/// Kinds of target a caller may ask the registry to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Unoptimized build with debug info.
    Debug,
    /// Optimized build.
    Release,
}

/// Compile profile for a scratch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    /// Target name (`debug`, `release`).
    pub name: String,
    /// rustc `-Copt-level`.
    pub opt_level: u8,
    /// Emit debug info.
    pub debug_info: bool,
    /// Cargo profile directory the owning module is built into.
    pub profile_dir: String,
}

impl RunTarget {
    fn debug() -> Self {
        Self {
            name: "debug".to_string(),
            opt_level: 0,
            debug_info: true,
            profile_dir: "debug".to_string(),
        }
    }

    fn release() -> Self {
        Self {
            name: "release".to_string(),
            opt_level: 3,
            debug_info: false,
            profile_dir: "release".to_string(),
        }
    }

    /// Whether the owning module must be built with `--release`.
    pub fn is_release(&self) -> bool {
        self.profile_dir == "release"
    }
}

impl Default for RunTarget {
    fn default() -> Self {
        Self::debug()
    }
}

impl NamedTarget for RunTarget {
    fn target_name(&self) -> &str {
        &self.name
    }
}

/// Named registry of targets.
#[derive(Debug, Clone)]
pub struct TargetRegistry<T: NamedTarget> {
    targets: BTreeMap<String, T>,
}

impl<T: NamedTarget> TargetRegistry<T> {
    fn empty() -> Self {
        Self {
            targets: BTreeMap::new(),
        }
    }

    fn register(&mut self, target: T) {
        self.targets.insert(target.target_name().to_string(), target);
    }

    /// Creating targets directly is not supported.
    pub fn create(&mut self, name: &str, kind: TargetKind) -> Result<&T> {
        tracing::debug!("Rejected direct creation of target {} ({:?})", name, kind);
        Err(Error::Unsupported(
            "creating targets directly is not supported".to_string(),
        ))
    }

    /// Kinds this registry can instantiate itself. Always empty.
    pub fn creatable_kinds(&self) -> &'static [TargetKind] {
        &[]
    }

    /// Look up a target by name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.targets.get(name)
    }

    /// Iterate targets in name order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.targets.values()
    }

    /// Registered target names in order.
    pub fn names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Factory for the built-in run targets.
pub struct TargetPresets;

impl TargetPresets {
    /// Registry with the `debug` and `release` targets.
    pub fn standard() -> TargetRegistry<RunTarget> {
        let mut registry = TargetRegistry::empty();
        registry.register(RunTarget::debug());
        registry.register(RunTarget::release());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_presets() {
        let registry = TargetPresets::standard();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["debug", "release"]);

        let release = registry.get("release").unwrap();
        assert_eq!(release.opt_level, 3);
        assert!(!release.debug_info);
        assert!(release.is_release());

        assert!(registry.get("wasm").is_none());
    }

    #[test]
    fn test_create_is_unsupported() {
        let mut registry = TargetPresets::standard();
        for kind in [TargetKind::Debug, TargetKind::Release] {
            let err = registry.create("custom", kind).unwrap_err();
            assert!(matches!(err, Error::Unsupported(_)));
        }
        assert!(registry.get("custom").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_no_creatable_kinds() {
        let registry = TargetPresets::standard();
        assert!(registry.creatable_kinds().is_empty());
    }

    #[test]
    fn test_default_target_is_debug() {
        let target = RunTarget::default();
        assert_eq!(target.target_name(), "debug");
        assert!(!target.is_release());
    }
}
