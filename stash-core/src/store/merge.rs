//! Shallow merge used by modifiable stores.

use serde_json::Value;

/// A value that can absorb a partial update.
///
/// Fields mentioned by the patch are replaced; everything else is kept.
/// The merge is shallow: a nested struct named by the patch is replaced
/// wholesale.
pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

/// JSON objects merge key by key. Any other patch replaces the value.
impl Merge for Value {
    type Patch = Value;

    fn merge(&mut self, patch: Value) {
        match (self, patch) {
            (Value::Object(current), Value::Object(updates)) => {
                for (field, value) in updates {
                    current.insert(field, value);
                }
            }
            (current, replacement) => *current = replacement,
        }
    }
}
