//! Type-checked accessors over untyped JSON.
//!
//! Every accessor answers `None` or a default on a shape mismatch instead of
//! failing, which is what the tree walk needs when the document layout is
//! unknown.
use serde_json::Value;

pub trait ValueExt {
    /// Member `key` when `self` is an object.
    fn field(&self, key: &str) -> Option<&Value>;

    /// String member `key`, or `""`.
    fn str_or_default(&self, key: &str) -> &str;

    /// Integer instant from any JSON number; floats truncate toward zero.
    fn as_instant(&self) -> Option<i64>;

    /// Non-negative count from any JSON number; floats truncate and
    /// negatives clamp to zero.
    fn as_count(&self) -> Option<u64>;
}

impl ValueExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    fn str_or_default(&self, key: &str) -> &str {
        self.field(key).and_then(Value::as_str).unwrap_or_default()
    }

    fn as_instant(&self) -> Option<i64> {
        self.as_i64().or_else(|| self.as_f64().map(|f| f.trunc() as i64))
    }

    fn as_count(&self) -> Option<u64> {
        self.as_u64().or_else(|| self.as_f64().map(|f| f.trunc() as u64))
    }
}
