//! PropertyMap: the key-value store on nodes, and the raw argument map
//! a resolver receives.

use hashbrown::HashMap;
use super::Value;

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Raw field arguments as handed over by the API-schema layer.
/// A `Value::Null` entry means the same as a missing one.
pub type Arguments = PropertyMap;

/// Build an argument map from (name, value) pairs.
pub fn arguments<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Arguments
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
