use super::{EntityDef, FieldDef, FieldType, RelationDef, RelationKind, TenantScope};

const fn has_many(name: &'static str, foreign_key: &'static str) -> RelationDef {
    RelationDef { name, target: name, kind: RelationKind::HasMany, foreign_key }
}

const fn belongs_to(name: &'static str, foreign_key: &'static str) -> RelationDef {
    RelationDef { name, target: name, kind: RelationKind::BelongsTo, foreign_key }
}

const ID: FieldDef = FieldDef::system("id", FieldType::Id);
const CREATED_AT: FieldDef = FieldDef::system("created_at", FieldType::Timestamp);
const UPDATED_AT: FieldDef = FieldDef::system("updated_at", FieldType::Timestamp);

// Staff and partner entities all share this shape: an optional owning user and
// an optional parent startup.
const STAFF_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::optional("user_id", FieldType::Id),
    FieldDef::optional("startup_id", FieldType::Id),
    CREATED_AT,
    UPDATED_AT,
];

const STAFF_RELATIONS: &[RelationDef] = &[belongs_to("user", "user_id"), belongs_to("startup", "startup_id")];

const STAFF_TENANT: TenantScope = TenantScope::Parent { foreign_key: "startup_id", parent: "startup" };

pub static ENTITIES: &[EntityDef] = &[
    EntityDef {
        name: "startup",
        route: "startups",
        fields: &[
            ID,
            FieldDef::optional("description", FieldType::String),
            FieldDef::optional("image", FieldType::String),
            FieldDef::required("name", FieldType::String),
            FieldDef::required("user_id", FieldType::Id),
            FieldDef::required("tenant_id", FieldType::Id),
            CREATED_AT,
            UPDATED_AT,
        ],
        relations: &[
            has_many("customer_support_representative", "startup_id"),
            has_many("data_analyst", "startup_id"),
            has_many("delivery_personnel", "startup_id"),
            has_many("partner_store", "startup_id"),
            has_many("team_member", "startup_id"),
            belongs_to("user", "user_id"),
        ],
        tenant: TenantScope::Column("tenant_id"),
    },
    EntityDef {
        name: "customer_support_representative",
        route: "customer-support-representatives",
        fields: STAFF_FIELDS,
        relations: STAFF_RELATIONS,
        tenant: STAFF_TENANT,
    },
    EntityDef {
        name: "data_analyst",
        route: "data-analysts",
        fields: STAFF_FIELDS,
        relations: STAFF_RELATIONS,
        tenant: STAFF_TENANT,
    },
    EntityDef {
        name: "delivery_personnel",
        route: "delivery-personnels",
        fields: STAFF_FIELDS,
        relations: STAFF_RELATIONS,
        tenant: STAFF_TENANT,
    },
    EntityDef {
        name: "partner_store",
        route: "partner-stores",
        fields: STAFF_FIELDS,
        relations: STAFF_RELATIONS,
        tenant: STAFF_TENANT,
    },
    EntityDef {
        name: "team_member",
        route: "team-members",
        fields: STAFF_FIELDS,
        relations: STAFF_RELATIONS,
        tenant: STAFF_TENANT,
    },
    EntityDef {
        name: "user",
        route: "users",
        fields: &[
            ID,
            FieldDef::required("email", FieldType::String),
            FieldDef::optional("firstName", FieldType::String),
            FieldDef::optional("lastName", FieldType::String),
            FieldDef::required("roq_user_id", FieldType::Id),
            FieldDef::required("tenant_id", FieldType::Id),
            CREATED_AT,
            UPDATED_AT,
        ],
        relations: &[
            has_many("startup", "user_id"),
            has_many("customer_support_representative", "user_id"),
            has_many("data_analyst", "user_id"),
            has_many("delivery_personnel", "user_id"),
            has_many("partner_store", "user_id"),
            has_many("team_member", "user_id"),
        ],
        tenant: TenantScope::Column("tenant_id"),
    },
];
