//! User administration.
//!
//! Staff can list and inspect accounts; only administrators may edit them,
//! change their role or (de)activate them. Every mutation goes through a
//! [`Confirmation`] and is followed by a re-fetch of the list.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument};

use shopfront_core::{Role, UserId};
use shopfront_storefront::SessionHandle;
use shopfront_storefront::api::types::UserProfile;
use shopfront_storefront::error::add_breadcrumb;
use shopfront_storefront::notice::Notice;
use shopfront_storefront::validation::{birth_date, required};
use shopfront_storefront::views::{Confirmation, Generation};

use crate::access::{StaffRole, actor};
use crate::api::{AdminApi, UserEdit};
use crate::error::{AdminError, Result};

/// Edit form for another user's basic data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEditForm {
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: String,
    pub birth_date: String,
}

impl UserEditForm {
    /// Prefill from `user`; the birth date keeps only its date part.
    #[must_use]
    pub fn from_user(user: &UserProfile) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            shipping_address: user.shipping_address.clone().unwrap_or_default(),
            birth_date: user
                .birth_date
                .as_deref()
                .and_then(|d| d.get(..10))
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn validate(&self) -> Result<UserEdit> {
        let born = birth_date(required(&self.birth_date, "Birth date")?)?;
        Ok(UserEdit {
            first_name: required(&self.first_name, "First name")?.to_string(),
            last_name: required(&self.last_name, "Last name")?.to_string(),
            shipping_address: required(&self.shipping_address, "Shipping address")?.to_string(),
            birth_date: born.format("%Y-%m-%d").to_string(),
        })
    }
}

/// A user mutation awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Edit { user: UserId, edit: UserEdit },
    ChangeRole { user: UserId, role: Role },
    Deactivate { user: UserId },
    Activate { user: UserId },
}

impl UserCommand {
    const fn user(&self) -> UserId {
        match self {
            Self::Edit { user, .. }
            | Self::ChangeRole { user, .. }
            | Self::Deactivate { user }
            | Self::Activate { user } => *user,
        }
    }

    const fn describe(&self) -> (&'static str, &'static str) {
        match self {
            Self::Edit { .. } => ("Could not update the user", "User updated"),
            Self::ChangeRole { .. } => ("Could not change the role", "Role updated"),
            Self::Deactivate { .. } => ("Could not deactivate the user", "User deactivated"),
            Self::Activate { .. } => ("Could not activate the user", "User activated"),
        }
    }
}

/// Observable user list state.
#[derive(Debug, Clone, Default)]
pub struct UsersState {
    pub users: Vec<UserProfile>,
    pub selected: Option<UserProfile>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

/// The user administration screen.
pub struct UsersView<A> {
    api: A,
    role: Option<StaffRole>,
    actor: String,
    state: Mutex<UsersState>,
    generation: Generation,
}

impl<A: AdminApi> UsersView<A> {
    /// Create the view for the staff member signed in to `session`.
    #[must_use]
    pub fn new(api: A, session: &SessionHandle) -> Self {
        Self {
            api,
            role: StaffRole::from_session(session),
            actor: actor(session),
            state: Mutex::new(UsersState::default()),
            generation: Generation::new(),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Option<StaffRole> {
        self.role
    }

    /// Whether edit, role and activation controls are shown.
    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.role.is_some_and(StaffRole::can_manage_users)
    }

    #[must_use]
    pub fn state(&self) -> UsersState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn users(&self) -> Vec<UserProfile> {
        self.lock_state().users.clone()
    }

    /// Fetch all users.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-staff sessions, or the request error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        if self.role.is_none() {
            return Err(AdminError::Denied("list users"));
        }
        let ticket = self.generation.begin();
        self.lock_state().loading = true;

        let result = self.api.list_users().await;
        if !self.generation.is_current(ticket) {
            debug!("Discarding superseded user list");
            return Ok(());
        }

        let mut state = self.lock_state();
        state.loading = false;
        match result {
            Ok(users) => {
                state.users = users;
                Ok(())
            }
            Err(err) => {
                state.notice = Some(err.notice("Could not load users"));
                Err(err.into())
            }
        }
    }

    /// Load one user into the detail view.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-staff sessions, or the request error.
    pub async fn open_detail(&self, user: UserId) -> Result<UserProfile> {
        if self.role.is_none() {
            return Err(AdminError::Denied("view users"));
        }
        match self.api.get_user(user).await {
            Ok(detail) => {
                self.lock_state().selected = Some(detail.clone());
                Ok(detail)
            }
            Err(err) => {
                self.lock_state().notice = Some(err.notice("Could not load the user"));
                Err(err.into())
            }
        }
    }

    /// Ask to save `form` for `user`.
    ///
    /// # Errors
    ///
    /// Returns `Denied` unless ADMIN, or `Validation` for a form problem.
    pub fn request_edit(&self, user: UserId, form: &UserEditForm) -> Result<Confirmation<UserCommand>> {
        self.guard("edit users")?;
        let edit = form.validate()?;
        let name = self.display_name(user)?;
        Ok(Confirmation::new(
            UserCommand::Edit { user, edit },
            format!("Save changes to {name}?"),
        ))
    }

    /// Ask to give `user` the role `role`.
    ///
    /// # Errors
    ///
    /// Returns `Denied` unless ADMIN.
    pub fn request_role_change(&self, user: UserId, role: Role) -> Result<Confirmation<UserCommand>> {
        self.guard("change roles")?;
        let name = self.display_name(user)?;
        Ok(Confirmation::new(
            UserCommand::ChangeRole { user, role },
            format!("Change the role of {name} to {role}?"),
        ))
    }

    /// Ask to deactivate an active user.
    ///
    /// # Errors
    ///
    /// Returns `Denied` unless ADMIN, or `NotApplicable` if already inactive.
    pub fn request_deactivate(&self, user: UserId) -> Result<Confirmation<UserCommand>> {
        self.guard("deactivate users")?;
        let listed = self.listed(user)?;
        if !listed.status.unwrap_or_default().is_active() {
            return Err(AdminError::NotApplicable(format!("{} is already inactive", listed.email)));
        }
        Ok(Confirmation::new(
            UserCommand::Deactivate { user },
            format!("Deactivate {}?", listed.email),
        ))
    }

    /// Ask to reactivate an inactive user.
    ///
    /// # Errors
    ///
    /// Returns `Denied` unless ADMIN, or `NotApplicable` if already active.
    pub fn request_activate(&self, user: UserId) -> Result<Confirmation<UserCommand>> {
        self.guard("activate users")?;
        let listed = self.listed(user)?;
        if listed.status.unwrap_or_default().is_active() {
            return Err(AdminError::NotApplicable(format!("{} is already active", listed.email)));
        }
        Ok(Confirmation::new(
            UserCommand::Activate { user },
            format!("Activate {}?", listed.email),
        ))
    }

    /// Perform a confirmed mutation, then re-fetch the list.
    ///
    /// # Errors
    ///
    /// Returns `Denied` unless ADMIN, or the request error.
    #[instrument(skip(self, confirmation), fields(user_id = %confirmation.action().user()))]
    pub async fn confirm(&self, confirmation: Confirmation<UserCommand>) -> Result<()> {
        self.guard("manage users")?;
        let command = confirmation.into_action();
        let (context, success) = command.describe();
        add_breadcrumb(
            "admin.users",
            success,
            Some(&[("user_id", command.user().to_string().as_str())]),
        );

        if let Err(err) = self.execute(&command).await {
            self.lock_state().notice = Some(err.notice(context));
            return Err(err.into());
        }

        info!(user_id = %command.user(), action = success, "User mutation applied");
        self.lock_state().notice = Some(Notice::success(success));
        self.refresh().await
    }

    pub fn dismiss_notice(&self) {
        self.lock_state().notice = None;
    }

    async fn execute(&self, command: &UserCommand) -> shopfront_storefront::Result<()> {
        match command {
            UserCommand::Edit { user, edit } => self.api.update_user(*user, edit, &self.actor).await,
            UserCommand::ChangeRole { user, role } => {
                let record = self.api.find_role(role.as_str()).await?;
                self.api.assign_role(*user, record.id, &self.actor).await
            }
            UserCommand::Deactivate { user } => self.api.deactivate_user(*user, &self.actor).await,
            UserCommand::Activate { user } => self.api.activate_user(*user, &self.actor).await,
        }
    }

    fn guard(&self, action: &'static str) -> Result<()> {
        if self.can_manage() {
            Ok(())
        } else {
            Err(AdminError::Denied(action))
        }
    }

    fn listed(&self, user: UserId) -> Result<UserProfile> {
        self.lock_state()
            .users
            .iter()
            .find(|u| u.id == user)
            .cloned()
            .ok_or_else(|| AdminError::NotApplicable(format!("User {user} is not listed")))
    }

    fn display_name(&self, user: UserId) -> Result<String> {
        self.listed(user)
            .map(|u| format!("{} {}", u.first_name, u.last_name).trim().to_string())
    }

    fn lock_state(&self) -> MutexGuard<'_, UsersState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
