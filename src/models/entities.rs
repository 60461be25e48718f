use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RelationCounts, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Startup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_support_representative: Option<Vec<CustomerSupportRepresentative>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_analyst: Option<Vec<DataAnalyst>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_personnel: Option<Vec<DeliveryPersonnel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_store: Option<Vec<PartnerStore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_member: Option<Vec<TeamMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<RelationCounts>,
}

impl Resource for Startup {
    const ENTITY: &'static str = "startup";
    const ROUTE: &'static str = "startups";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roq_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<Vec<Startup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_support_representative: Option<Vec<CustomerSupportRepresentative>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_analyst: Option<Vec<DataAnalyst>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_personnel: Option<Vec<DeliveryPersonnel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_store: Option<Vec<PartnerStore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_member: Option<Vec<TeamMember>>,
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<RelationCounts>,
}

impl Resource for User {
    const ENTITY: &'static str = "user";
    const ROUTE: &'static str = "users";
}

// The staff entities share one shape: an optional owning user and an optional
// parent startup, both loadable through `relations`.
macro_rules! staff_model {
    ($name:ident, $entity:literal, $route:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub id: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub user_id: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub startup_id: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub created_at: Option<DateTime<Utc>>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub updated_at: Option<DateTime<Utc>>,

            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub user: Option<Box<User>>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub startup: Option<Box<Startup>>,
        }

        impl Resource for $name {
            const ENTITY: &'static str = $entity;
            const ROUTE: &'static str = $route;
        }
    };
}

staff_model!(CustomerSupportRepresentative, "customer_support_representative", "customer-support-representatives");
staff_model!(DataAnalyst, "data_analyst", "data-analysts");
staff_model!(DeliveryPersonnel, "delivery_personnel", "delivery-personnels");
staff_model!(PartnerStore, "partner_store", "partner-stores");
staff_model!(TeamMember, "team_member", "team-members");
