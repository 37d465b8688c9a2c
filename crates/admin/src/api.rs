//! Administration endpoints of the REST API.
//!
//! User mutations carry a `performedBy` query parameter naming the acting
//! administrator, which the backend records in its audit trail.

use std::future::Future;

use serde::{Deserialize, Serialize};

use shopfront_core::{OrderId, OrderStatus, RoleId, UserId};
use shopfront_storefront::ApiClient;
use shopfront_storefront::api::types::{Listing, Order, UserProfile};
use shopfront_storefront::error::Result;

/// A role as returned by `GET /roles/search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
}

/// Body of `PUT /admin/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdit {
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: String,
    pub birth_date: String,
}

/// Body of `PUT /admin/users/{id}/role`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleAssignment {
    role_id: RoleId,
}

/// Backend operations used by the administration views.
pub trait AdminApi: Send + Sync {
    // Users
    fn list_users(&self) -> impl Future<Output = Result<Vec<UserProfile>>> + Send;
    fn get_user(&self, user: UserId) -> impl Future<Output = Result<UserProfile>> + Send;
    fn update_user(
        &self,
        user: UserId,
        edit: &UserEdit,
        performed_by: &str,
    ) -> impl Future<Output = Result<()>> + Send;
    /// Look a role up by its name, e.g. `WORKER`.
    fn find_role(&self, name: &str) -> impl Future<Output = Result<RoleRecord>> + Send;
    fn assign_role(
        &self,
        user: UserId,
        role: RoleId,
        performed_by: &str,
    ) -> impl Future<Output = Result<()>> + Send;
    fn deactivate_user(
        &self,
        user: UserId,
        performed_by: &str,
    ) -> impl Future<Output = Result<()>> + Send;
    fn activate_user(
        &self,
        user: UserId,
        performed_by: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    // Orders
    fn list_all_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;
    fn get_any_order(&self, order: OrderId) -> impl Future<Output = Result<Order>> + Send;
    fn set_order_status(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl AdminApi for ApiClient {
    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let listing: Listing<UserProfile> = self.get("/admin/users").fetch().await?;
        Ok(listing.0)
    }

    async fn get_user(&self, user: UserId) -> Result<UserProfile> {
        self.get(&format!("/admin/users/{user}")).fetch().await
    }

    async fn update_user(&self, user: UserId, edit: &UserEdit, performed_by: &str) -> Result<()> {
        self.put(&format!("/admin/users/{user}"))
            .query(&[("performedBy", performed_by)])
            .json(edit)
            .send()
            .await
    }

    async fn find_role(&self, name: &str) -> Result<RoleRecord> {
        self.get("/roles/search")
            .query(&[("name", name)])
            .fetch()
            .await
    }

    async fn assign_role(&self, user: UserId, role: RoleId, performed_by: &str) -> Result<()> {
        self.put(&format!("/admin/users/{user}/role"))
            .query(&[("performedBy", performed_by)])
            .json(&RoleAssignment { role_id: role })
            .send()
            .await
    }

    async fn deactivate_user(&self, user: UserId, performed_by: &str) -> Result<()> {
        self.delete(&format!("/admin/users/{user}"))
            .query(&[("performedBy", performed_by)])
            .send()
            .await
    }

    async fn activate_user(&self, user: UserId, performed_by: &str) -> Result<()> {
        self.put(&format!("/admin/users/{user}/activate"))
            .query(&[("performedBy", performed_by)])
            .send()
            .await
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        let listing: Listing<Order> = self.get("/admin/orders").fetch().await?;
        Ok(listing.0)
    }

    async fn get_any_order(&self, order: OrderId) -> Result<Order> {
        self.get(&format!("/admin/orders/{order}")).fetch().await
    }

    async fn set_order_status(&self, order: OrderId, status: OrderStatus) -> Result<()> {
        self.put(&format!("/admin/orders/{order}/status"))
            .query(&[("newStatus", status.as_str())])
            .send()
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_edit_wire_format() {
        let edit = UserEdit {
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            shipping_address: "Calle 1".to_string(),
            birth_date: "1990-04-12".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&edit).unwrap(),
            json!({
                "firstName": "Ana",
                "lastName": "Pérez",
                "shippingAddress": "Calle 1",
                "birthDate": "1990-04-12"
            })
        );
    }

    #[test]
    fn test_role_assignment_wire_format() {
        let body = RoleAssignment { role_id: RoleId::new(2) };
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"roleId": 2}));
    }

    #[test]
    fn test_role_record_decodes() {
        let role: RoleRecord = serde_json::from_value(json!({"id": 2, "name": "WORKER"})).unwrap();
        assert_eq!(role.id, RoleId::new(2));
    }
}
