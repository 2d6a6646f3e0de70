//! Typed runtime values and the process-wide key registry.
//!
//! A runtime value is a typed key/value pair attached to a proxy. The key
//! fixes the wire name (the env var set on the delegate workload), whether
//! the value is exposed through the JSON API, and the string codec for the
//! value type. Values are stored in wire form and decoded on access.
//!
//! Keys are registered once at startup, keyed by env-var name. Looking up an
//! unregistered key while decoding JSON is a hard error, not a silent miss.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::RwLock;

use crate::error::{ModelError, ModelResult};

/// Conversion between a typed runtime value and its wire string.
pub trait RuntimeValueCodec: Sized {
    fn encode(&self) -> String;
    fn decode(raw: &str) -> Option<Self>;
}

impl RuntimeValueCodec for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl RuntimeValueCodec for bool {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl RuntimeValueCodec for i64 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Typed key identifying one runtime value.
///
/// Keys are process-lifetime statics; see the builtins below.
pub struct RuntimeValueKey<T> {
    /// Stable key name (diagnostic).
    pub name: &'static str,
    /// Wire name: the env var set on the delegate workload.
    pub env_var: &'static str,
    /// Whether the value is exposed in the JSON API form.
    pub include_in_api: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T: RuntimeValueCodec> RuntimeValueKey<T> {
    pub const fn new(name: &'static str, env_var: &'static str, include_in_api: bool) -> Self {
        Self {
            name,
            env_var,
            include_in_api,
            _value: PhantomData,
        }
    }

    /// Build a [`RuntimeValue`] for this key from a typed value.
    pub fn value(&self, value: T) -> RuntimeValue {
        RuntimeValue {
            name: self.name,
            env_var: self.env_var,
            include_in_api: self.include_in_api,
            value: value.encode(),
        }
    }

    fn meta(&self) -> RegisteredKey {
        RegisteredKey {
            name: self.name,
            env_var: self.env_var,
            include_in_api: self.include_in_api,
        }
    }
}

/// A concrete runtime value, stored in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeValue {
    pub name: &'static str,
    pub env_var: &'static str,
    pub include_in_api: bool,
    pub value: String,
}

impl RuntimeValue {
    /// Rebuild a value from registry metadata and a raw wire string.
    pub fn from_registered(key: RegisteredKey, value: String) -> Self {
        Self {
            name: key.name,
            env_var: key.env_var,
            include_in_api: key.include_in_api,
            value,
        }
    }
}

/// Anything that carries runtime values: proxies, and any future holder.
pub trait RuntimeValueHolder {
    /// All runtime values, keyed by env-var name.
    fn runtime_values(&self) -> &BTreeMap<String, RuntimeValue>;

    /// Typed lookup; the value must be present and decodable.
    fn runtime_value<T: RuntimeValueCodec>(&self, key: &RuntimeValueKey<T>) -> ModelResult<T> {
        let raw = self
            .runtime_values()
            .get(key.env_var)
            .ok_or(ModelError::MissingRuntimeValue(key.env_var))?;
        T::decode(&raw.value)
            .ok_or_else(|| ModelError::UndecodableRuntimeValue(key.env_var, raw.value.clone()))
    }

    /// Typed lookup returning `None` when the value is absent or undecodable.
    fn runtime_value_or_none<T: RuntimeValueCodec>(&self, key: &RuntimeValueKey<T>) -> Option<T> {
        self.runtime_values()
            .get(key.env_var)
            .and_then(|raw| T::decode(&raw.value))
    }
}

// ── Key registry ───────────────────────────────────────────────────

/// Type-erased metadata for a registered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredKey {
    pub name: &'static str,
    pub env_var: &'static str,
    pub include_in_api: bool,
}

static REGISTRY: RwLock<BTreeMap<&'static str, RegisteredKey>> = RwLock::new(BTreeMap::new());

/// Register a key in the process-wide registry.
///
/// Re-registering the same key is a no-op; registering a different key under
/// an already-taken env-var name fails.
pub fn register_key<T: RuntimeValueCodec>(key: &RuntimeValueKey<T>) -> ModelResult<()> {
    let meta = key.meta();
    let mut registry = REGISTRY.write().expect("runtime value registry poisoned");
    match registry.get(meta.env_var) {
        Some(existing) if *existing == meta => Ok(()),
        Some(_) => Err(ModelError::ConflictingRuntimeValueKey(meta.env_var)),
        None => {
            registry.insert(meta.env_var, meta);
            Ok(())
        }
    }
}

/// Look up a registered key by env-var name.
pub fn registered_key(env_var: &str) -> ModelResult<RegisteredKey> {
    REGISTRY
        .read()
        .expect("runtime value registry poisoned")
        .get(env_var)
        .copied()
        .ok_or_else(|| ModelError::UnknownRuntimeValueKey(env_var.to_string()))
}

// ── Builtin keys ───────────────────────────────────────────────────

/// The seat this proxy occupies.
pub static SEAT_ID: RuntimeValueKey<String> =
    RuntimeValueKey::new("seat-id", "SHINYPROXY_SEAT_ID", false);

/// Marks a delegate workload.
pub static DELEGATE_PROXY: RuntimeValueKey<bool> =
    RuntimeValueKey::new("delegate-proxy", "SHINYPROXY_DELEGATE_PROXYS", false);

/// The delegate id used by the request router.
pub static TARGET_ID: RuntimeValueKey<String> =
    RuntimeValueKey::new("target-id", "SHINYPROXY_TARGET_ID", true);

/// The externally visible URL prefix of a proxy.
pub static PUBLIC_PATH: RuntimeValueKey<String> =
    RuntimeValueKey::new("public-path", "SHINYPROXY_PUBLIC_PATH", true);

/// Register every builtin key. Called at startup; idempotent.
pub fn register_builtin_keys() {
    register_key(&SEAT_ID).expect("builtin runtime value keys are consistent");
    register_key(&DELEGATE_PROXY).expect("builtin runtime value keys are consistent");
    register_key(&TARGET_ID).expect("builtin runtime value keys are consistent");
    register_key(&PUBLIC_PATH).expect("builtin runtime value keys are consistent");
}
