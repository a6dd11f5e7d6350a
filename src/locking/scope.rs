// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::{HilockError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Segment separating key components in the store.
pub const KEY_SEPARATOR: char = ':';
/// Marker segment placed in front of the module name for intention-set keys.
const INTENTION_SEGMENT: &str = "IX";

/// Granularity at which a lock is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockLevel {
    /// One unit of work inside a module.
    Class,
    /// The whole module, excluding every class lock within it.
    Module,
}

impl LockLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockLevel::Class => "class",
            LockLevel::Module => "module",
        }
    }
}

impl fmt::Display for LockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockLevel {
    type Err = HilockError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "class" => Ok(LockLevel::Class),
            "module" => Ok(LockLevel::Module),
            other => Err(HilockError::InvalidScope(format!(
                "unknown lock level '{other}', expected 'class' or 'module'"
            ))),
        }
    }
}

/// Hierarchical namespace a lock lives in: a lock group (`prefix`), a coarse
/// `module`, and a fine-grained `class` inside that module.
///
/// Components are trimmed and lowercased so that callers spelling the same
/// identity differently still contend on the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockScope {
    prefix: String,
    module: String,
    class: String,
}

impl LockScope {
    pub fn new(prefix: &str, module: &str, class: &str) -> Result<Self> {
        Ok(Self {
            prefix: normalize_component("prefix", prefix)?,
            module: normalize_component("module", module)?,
            class: normalize_component("class", class)?,
        })
    }

    /// Derives module and class from the last two path segments of `T`'s type
    /// name, e.g. `app::billing::OrderSync` becomes module `billing`, class
    /// `ordersync`.
    pub fn for_type<T: ?Sized>(prefix: &str) -> Result<Self> {
        Self::from_type_path(prefix, std::any::type_name::<T>())
    }

    pub fn from_type_path(prefix: &str, type_path: &str) -> Result<Self> {
        let without_generics = type_path.split('<').next().unwrap_or(type_path);
        let mut segments = without_generics.rsplit("::");
        let class = segments.next().unwrap_or_default();
        let module = segments.next().ok_or_else(|| {
            HilockError::InvalidScope(format!(
                "type path '{type_path}' has no enclosing module"
            ))
        })?;
        Self::new(prefix, module, class)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.prefix, self.module, self.class)
    }
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn normalize_component(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HilockError::InvalidScope(format!("{name} must not be empty")));
    }
    if trimmed.contains(KEY_SEPARATOR) {
        return Err(HilockError::InvalidScope(format!(
            "{name} '{trimmed}' must not contain '{KEY_SEPARATOR}'"
        )));
    }
    Ok(trimmed.to_lowercase())
}

/// The three store keys a scope maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeKeys {
    pub class_key: String,
    pub module_key: String,
    pub intention_key: String,
}

impl ScopeKeys {
    /// Key holding the lock for `level`.
    pub fn lock_key(&self, level: LockLevel) -> &str {
        match level {
            LockLevel::Class => &self.class_key,
            LockLevel::Module => &self.module_key,
        }
    }
}

/// Pure key derivation: `<ns>:<prefix>:<class>`, `<ns>:<prefix>:<module>` and
/// `<ns>:<prefix>:IX:<module>`.
pub fn resolve(namespace: &str, scope: &LockScope) -> ScopeKeys {
    let base = format!("{namespace}{KEY_SEPARATOR}{}{KEY_SEPARATOR}", scope.prefix);
    ScopeKeys {
        class_key: format!("{base}{}", scope.class),
        module_key: format!("{base}{}", scope.module),
        intention_key: format!("{base}{INTENTION_SEGMENT}{KEY_SEPARATOR}{}", scope.module),
    }
}

/// Resolves scopes against one namespace and memoizes the result.
#[derive(Debug)]
pub struct KeyResolver {
    namespace: String,
    cache: Mutex<HashMap<LockScope, Arc<ScopeKeys>>>,
}

impl KeyResolver {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn keys(&self, scope: &LockScope) -> Arc<ScopeKeys> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(resolve(&self.namespace, scope)))
            .clone()
    }

    /// Key for a flat, non-hierarchical lock in this namespace.
    pub fn flat_key(&self, name: &str) -> String {
        format!("{}{KEY_SEPARATOR}OL{KEY_SEPARATOR}{name}", self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OrderSync;

    #[test]
    fn resolves_three_partitioned_keys() {
        let scope = LockScope::new("default", "Billing", "OrderSync").unwrap();
        let keys = resolve("DL", &scope);
        assert_eq!(keys.class_key, "DL:default:ordersync");
        assert_eq!(keys.module_key, "DL:default:billing");
        assert_eq!(keys.intention_key, "DL:default:IX:billing");
        assert_eq!(keys.lock_key(LockLevel::Module), "DL:default:billing");
    }

    #[test]
    fn different_prefixes_never_collide() {
        let a = resolve("DL", &LockScope::new("a", "m", "c").unwrap());
        let b = resolve("DL", &LockScope::new("b", "m", "c").unwrap());
        assert_ne!(a.class_key, b.class_key);
        assert_ne!(a.module_key, b.module_key);
        assert_ne!(a.intention_key, b.intention_key);
    }

    #[test]
    fn rejects_empty_and_separator_components() {
        assert!(matches!(
            LockScope::new("default", "  ", "OrderSync"),
            Err(HilockError::InvalidScope(_))
        ));
        assert!(matches!(
            LockScope::new("a:b", "billing", "OrderSync"),
            Err(HilockError::InvalidScope(_))
        ));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let scope = LockScope::new(" Default ", "BILLING", "OrderSync").unwrap();
        assert_eq!(scope, LockScope::new("default", "billing", "ordersync").unwrap());
        assert_eq!(scope.label(), "default/billing/ordersync");
    }

    #[test]
    fn derives_identity_from_type_name() {
        let scope = LockScope::for_type::<OrderSync>("default").unwrap();
        assert_eq!(scope.module(), "tests");
        assert_eq!(scope.class(), "ordersync");

        let generic =
            LockScope::from_type_path("default", "app::billing::Worker<app::Job>").unwrap();
        assert_eq!(generic.module(), "billing");
        assert_eq!(generic.class(), "worker");

        assert!(LockScope::from_type_path("default", "Standalone").is_err());
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("Module".parse::<LockLevel>().unwrap(), LockLevel::Module);
        assert_eq!("class".parse::<LockLevel>().unwrap(), LockLevel::Class);
        assert!("table".parse::<LockLevel>().is_err());
    }

    #[test]
    fn resolver_caches_per_scope() {
        let resolver = KeyResolver::new("DL");
        let scope = LockScope::new("default", "billing", "ordersync").unwrap();
        let first = resolver.keys(&scope);
        let second = resolver.keys(&scope);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.flat_key("payout"), "DL:OL:payout");
    }
}
