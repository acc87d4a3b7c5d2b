//! Small field-mapping conventions shared by resources.

use declarative::{Attribute, Attrs};

/// Optional boolean that reads back as `false` when unset.
pub fn flag() -> Attribute {
    Attribute::bool().optional().default(false)
}

/// Store an integer, `null` for zero.
pub fn set_nonzero(d: &mut impl Attrs, key: &str, value: i64) {
    if value == 0 {
        d.set_null(key);
    } else {
        d.set(key, value);
    }
}
