//! Catalogue of the dashboard's logical resources

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::impl_label_conversions;
use crate::types::request::{CachePolicy, RequestDescriptor};

/// A listable resource of the payment-orchestration API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiResource {
    Connectors,
    Payments,
    Refunds,
    Disputes,
    ApiKeys,
    BusinessProfiles,
    Customers,
}

impl_label_conversions!(ApiResource {
    Connectors => "connectors",
    Payments => "payments",
    Refunds => "refunds",
    Disputes => "disputes",
    ApiKeys => "api_keys",
    BusinessProfiles => "business_profiles",
    Customers => "customers",
});

impl ApiResource {
    pub const ALL: [Self; 7] = [
        Self::Connectors,
        Self::Payments,
        Self::Refunds,
        Self::Disputes,
        Self::ApiKeys,
        Self::BusinessProfiles,
        Self::Customers,
    ];

    /// Cache/resource key used by the client facade.
    pub fn key(self) -> &'static str {
        match self {
            Self::Connectors => "connectors",
            Self::Payments => "payments",
            Self::Refunds => "refunds",
            Self::Disputes => "disputes",
            Self::ApiKeys => "api_keys",
            Self::BusinessProfiles => "business_profiles",
            Self::Customers => "customers",
        }
    }

    /// Descriptor for the resource's list endpoint.
    ///
    /// Refund listing is a filtered POST upstream; it is still a read, so it
    /// keeps the network-first cache policy.
    pub fn list_descriptor(self, merchant_id: &str) -> RequestDescriptor {
        match self {
            Self::Connectors => RequestDescriptor::get(format!("/account/{merchant_id}/connectors")),
            Self::Payments => RequestDescriptor::get("/payments/list"),
            Self::Refunds => RequestDescriptor::post("/refunds/list", json!({}))
                .with_cache_policy(CachePolicy::NetworkFirst),
            Self::Disputes => RequestDescriptor::get("/disputes/list"),
            Self::ApiKeys => RequestDescriptor::get(format!("/api_keys/{merchant_id}/list")),
            Self::BusinessProfiles => {
                RequestDescriptor::get(format!("/account/{merchant_id}/business_profile"))
            }
            Self::Customers => RequestDescriptor::get("/customers/list"),
        }
    }
}
