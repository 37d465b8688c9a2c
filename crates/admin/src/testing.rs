//! In-memory administration backend for view tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::StatusCode;
use serde_json::json;

use shopfront_core::{Email, OrderId, OrderStatus, RoleId, UserId, UserStatus};
use shopfront_storefront::api::types::{Order, RoleRef, UserProfile};
use shopfront_storefront::error::Result;
use shopfront_storefront::{ClientError, Session, SessionHandle};

use crate::api::{AdminApi, RoleRecord, UserEdit};

const ROLES: [(i64, &str); 3] = [(1, "ADMIN"), (2, "WORKER"), (3, "USER")];

#[derive(Clone, Default)]
pub struct FakeAdminApi {
    inner: Arc<FakeAdminBackend>,
}

#[derive(Default)]
struct FakeAdminBackend {
    calls: Mutex<Vec<String>>,
    users: Mutex<Vec<UserProfile>>,
    orders: Mutex<Vec<Order>>,
    failures: Mutex<HashMap<&'static str, StatusCode>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

/// A signed-in session whose profile holds `roles` (comma separated).
pub fn staff_session(roles: &str) -> SessionHandle {
    let session = SessionHandle::in_memory();
    let roles: Vec<_> = roles.split(',').map(|r| json!({"name": r.trim()})).collect();
    let profile = serde_json::from_value(json!({
        "id": 1,
        "firstName": "Root",
        "lastName": "Admin",
        "email": "root@example.com",
        "roles": roles
    }))
    .unwrap();
    session.establish(Session::new("opaque-token", profile)).unwrap();
    session
}

pub fn user(id: i64, email: &str, role: &str, status: UserStatus) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        first_name: "Ana".to_string(),
        last_name: "Pérez".to_string(),
        email: Email::parse(email).unwrap(),
        shipping_address: Some("Calle 1".to_string()),
        birth_date: Some("1990-04-12T00:00:00".to_string()),
        roles: vec![RoleRef {
            id: None,
            name: role.to_string(),
        }],
        status: Some(status),
    }
}

pub fn order(id: i64, status: OrderStatus) -> Order {
    let number = (!status.is_pending()).then(|| format!("ORD-{id:04}"));
    serde_json::from_value(json!({
        "id": id,
        "orderNumber": number,
        "status": status.as_str(),
        "shippingAddress": "Calle 1",
        "items": [{
            "id": id * 10,
            "product": {"id": 42, "description": "Mug", "amount": 10.0, "availableQuantity": 8},
            "price": 10.0,
            "quantity": 1
        }],
        "user": {"email": "ana@example.com", "firstName": "Ana", "lastName": "Pérez"}
    }))
    .unwrap()
}

impl FakeAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(self, users: Vec<UserProfile>) -> Self {
        *lock(&self.inner.users) = users;
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *lock(&self.inner.orders) = orders;
        self
    }

    pub fn fail(&self, operation: &'static str, status: StatusCode) {
        lock(&self.inner.failures).insert(operation, status);
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.inner.calls).clear();
    }

    fn record(&self, operation: &'static str, call: String) -> Result<()> {
        lock(&self.inner.calls).push(call);
        match lock(&self.inner.failures).get(operation) {
            None => Ok(()),
            Some(&StatusCode::FORBIDDEN) => Err(ClientError::Forbidden("rejected".to_string())),
            Some(&StatusCode::NOT_FOUND) => Err(ClientError::NotFound(operation.to_string())),
            Some(&status) => Err(ClientError::Api {
                status,
                message: String::new(),
            }),
        }
    }

    fn with_user<T>(&self, id: UserId, f: impl FnOnce(&mut UserProfile) -> T) -> Result<T> {
        lock(&self.inner.users)
            .iter_mut()
            .find(|u| u.id == id)
            .map(f)
            .ok_or_else(|| ClientError::NotFound(format!("/admin/users/{id}")))
    }
}

impl AdminApi for FakeAdminApi {
    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.record("list_users", "GET /admin/users".to_string())?;
        Ok(lock(&self.inner.users).clone())
    }

    async fn get_user(&self, user: UserId) -> Result<UserProfile> {
        self.record("get_user", format!("GET /admin/users/{user}"))?;
        self.with_user(user, |u| u.clone())
    }

    async fn update_user(&self, user: UserId, edit: &UserEdit, performed_by: &str) -> Result<()> {
        self.record(
            "update_user",
            format!("PUT /admin/users/{user}?performedBy={performed_by}"),
        )?;
        self.with_user(user, |u| {
            u.first_name.clone_from(&edit.first_name);
            u.last_name.clone_from(&edit.last_name);
            u.shipping_address = Some(edit.shipping_address.clone());
            u.birth_date = Some(edit.birth_date.clone());
        })
    }

    async fn find_role(&self, name: &str) -> Result<RoleRecord> {
        self.record("find_role", format!("GET /roles/search?name={name}"))?;
        ROLES
            .iter()
            .find(|(_, role)| role.eq_ignore_ascii_case(name))
            .map(|&(id, role)| RoleRecord {
                id: RoleId::new(id),
                name: role.to_string(),
            })
            .ok_or_else(|| ClientError::NotFound("/roles/search".to_string()))
    }

    async fn assign_role(&self, user: UserId, role: RoleId, performed_by: &str) -> Result<()> {
        self.record(
            "assign_role",
            format!("PUT /admin/users/{user}/role?performedBy={performed_by} roleId={role}"),
        )?;
        let name = ROLES
            .iter()
            .find(|(id, _)| *id == role.as_i64())
            .map_or("USER", |(_, name)| name);
        self.with_user(user, |u| {
            u.roles = vec![RoleRef {
                id: Some(role),
                name: name.to_string(),
            }];
        })
    }

    async fn deactivate_user(&self, user: UserId, performed_by: &str) -> Result<()> {
        self.record(
            "deactivate_user",
            format!("DELETE /admin/users/{user}?performedBy={performed_by}"),
        )?;
        self.with_user(user, |u| u.status = Some(UserStatus::Inactive))
    }

    async fn activate_user(&self, user: UserId, performed_by: &str) -> Result<()> {
        self.record(
            "activate_user",
            format!("PUT /admin/users/{user}/activate?performedBy={performed_by}"),
        )?;
        self.with_user(user, |u| u.status = Some(UserStatus::Active))
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        self.record("list_all_orders", "GET /admin/orders".to_string())?;
        Ok(lock(&self.inner.orders).clone())
    }

    async fn get_any_order(&self, order: OrderId) -> Result<Order> {
        self.record("get_any_order", format!("GET /admin/orders/{order}"))?;
        lock(&self.inner.orders)
            .iter()
            .find(|o| o.id == order)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/admin/orders/{order}")))
    }

    async fn set_order_status(&self, order: OrderId, status: OrderStatus) -> Result<()> {
        self.record(
            "set_order_status",
            format!("PUT /admin/orders/{order}/status?newStatus={status}"),
        )?;
        if let Some(o) = lock(&self.inner.orders).iter_mut().find(|o| o.id == order) {
            o.status = status;
        }
        Ok(())
    }
}
