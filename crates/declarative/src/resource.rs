//! Resource and data source traits
//!
//! A resource is a type of managed object with a CRUD lifecycle against some
//! client `C`. The framework never looks inside `C`; it only hands it to the
//! resource. Every operation receives the resource's [`ResourceData`] and
//! leaves behind the observed state, with an empty identifier meaning the
//! object does not exist.

use crate::data::ResourceData;
use crate::schema::Schema;
use crate::upgrade::StateUpgrader;
use anyhow::Result;

/// A managed resource type.
///
/// # Example
///
/// ```ignore
/// use declarative::{Attribute, Resource, ResourceData, Schema};
///
/// struct Note;
///
/// impl Resource<Notebook> for Note {
///     fn type_name(&self) -> &'static str {
///         "note"
///     }
///
///     fn schema(&self) -> Schema {
///         Schema::new().attr("name", Attribute::string().required().force_new())
///     }
///
///     fn create(&self, book: &Notebook, d: &mut ResourceData) -> anyhow::Result<()> {
///         book.add(&d.get_string("name"))?;
///         d.set_id(d.get_string("name"));
///         self.read(book, d)
///     }
///
///     // read, update, delete ...
/// }
/// ```
pub trait Resource<C: ?Sized>: Send + Sync {
    /// Registered type name
    fn type_name(&self) -> &'static str;

    /// Attribute schema, including its version
    fn schema(&self) -> Schema;

    /// Upgraders for state written by older schema versions
    fn upgraders(&self) -> Vec<StateUpgrader> {
        Vec::new()
    }

    /// Create the object, then read it back.
    fn create(&self, client: &C, d: &mut ResourceData) -> Result<()>;

    /// Refresh observed state. Clears the identifier if the object is gone.
    fn read(&self, client: &C, d: &mut ResourceData) -> Result<()>;

    /// Apply in-place changes, then read back.
    fn update(&self, client: &C, d: &mut ResourceData) -> Result<()> {
        let _ = (client, d);
        anyhow::bail!("{} cannot be updated in place", self.type_name())
    }

    /// Delete the object and clear the identifier.
    fn delete(&self, client: &C, d: &mut ResourceData) -> Result<()>;

    /// Adopt an existing object given only its identifier.
    fn import(&self, client: &C, d: &mut ResourceData) -> Result<()> {
        self.read(client, d)
    }
}

/// A read-only data source type.
pub trait DataSource<C: ?Sized>: Send + Sync {
    /// Registered type name
    fn type_name(&self) -> &'static str;

    /// Attribute schema
    fn schema(&self) -> Schema;

    /// Fill in computed attributes from the lookup attributes.
    fn read(&self, client: &C, d: &mut ResourceData) -> Result<()>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource<C> = Box<dyn Resource<C>>;

/// A boxed data source for type-erased storage
pub type BoxedDataSource<C> = Box<dyn DataSource<C>>;
