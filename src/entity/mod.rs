//! Entity registry: the declarative description of every admin entity.
//!
//! Handlers, the query translator, validation and both stores are driven from
//! these tables, so adding an entity is a matter of adding one `EntityDef`.

mod definitions;

pub use definitions::ENTITIES;

/// Storage/validation type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Opaque identifier (UUID in storage, string at the API boundary)
    Id,
    /// Free text, participates in `searchTerm`
    String,
    /// RFC 3339 timestamp
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub nullable: bool,
    /// Generated by the data layer, never accepted from clients
    pub system: bool,
}

impl FieldDef {
    pub const fn system(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: false, nullable: false, system: true }
    }

    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: true, nullable: false, system: false }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: false, nullable: true, system: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Foreign key lives on the target and points at this entity's id
    HasMany,
    /// Foreign key lives on this entity and points at the target's id
    BelongsTo,
}

#[derive(Debug, Clone, Copy)]
pub struct RelationDef {
    pub name: &'static str,
    pub target: &'static str,
    pub kind: RelationKind,
    pub foreign_key: &'static str,
}

impl RelationDef {
    pub fn target_def(&self) -> &'static EntityDef {
        by_name(self.target).unwrap_or_else(|| panic!("relation {} targets unknown entity {}", self.name, self.target))
    }

    pub fn is_to_many(&self) -> bool {
        self.kind == RelationKind::HasMany
    }
}

/// How an entity is tied to a tenant.
#[derive(Debug, Clone, Copy)]
pub enum TenantScope {
    /// The entity carries the tenant id itself
    Column(&'static str),
    /// The entity belongs to a tenant through a parent record
    Parent {
        foreign_key: &'static str,
        parent: &'static str,
    },
}

#[derive(Debug)]
pub struct EntityDef {
    /// ORM model / table name, e.g. `customer_support_representative`
    pub name: &'static str,
    /// REST route slug, e.g. `customer-support-representatives`
    pub route: &'static str,
    pub fields: &'static [FieldDef],
    pub relations: &'static [RelationDef],
    pub tenant: TenantScope,
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Plain text columns used by `searchTerm`
    pub fn searchable_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.ty == FieldType::String && !f.system)
            .map(|f| f.name)
            .collect()
    }

    pub fn writable_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| !f.system)
    }
}

pub fn by_name(name: &str) -> Option<&'static EntityDef> {
    ENTITIES.iter().find(|e| e.name == name)
}

/// Map a REST route slug onto its entity; unknown slugs have no entity.
pub fn by_route(route: &str) -> Option<&'static EntityDef> {
    ENTITIES.iter().find(|e| e.route == route)
}
