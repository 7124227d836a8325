//! Entities served by the package API and their merge patches.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::Merge;

const GRAVATAR_BASE: &str = "https://0.gravatar.com/avatar/";

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Contributor,
    Developer,
    User,
}

impl Role {
    pub fn has_admin_access(self) -> bool {
        self == Role::Admin
    }

    pub fn has_moderator_access(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

impl UserInfo {
    /// Avatar URL derived from the normalized email address.
    pub fn gravatar_url(&self) -> String {
        let normalized = self.email.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        format!("{GRAVATAR_BASE}{}", hex::encode(digest))
    }
}

/// Field-wise update for [`UserInfo`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoPatch {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl Merge for UserInfo {
    type Patch = UserInfoPatch;

    fn merge(&mut self, patch: UserInfoPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }
}

/// A package in the development repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevPackage {
    pub name: String,
    pub description: String,
    pub owner_user_id: u64,
    pub homepage_url: Option<String>,
    pub requires_patching: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevPackagePatch {
    pub description: Option<String>,
    /// `Some(None)` clears the homepage.
    pub homepage_url: Option<Option<String>>,
    pub requires_patching: Option<bool>,
}

impl Merge for DevPackage {
    type Patch = DevPackagePatch;

    fn merge(&mut self, patch: DevPackagePatch) {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(homepage_url) = patch.homepage_url {
            self.homepage_url = homepage_url;
        }
        if let Some(requires_patching) = patch.requires_patching {
            self.requires_patching = requires_patching;
        }
    }
}

/// Per-package view state kept next to a [`DevPackage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevPackageView {
    pub selected_release: Option<String>,
    pub show_archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevPackageViewPatch {
    pub selected_release: Option<Option<String>>,
    pub show_archived: Option<bool>,
}

impl Merge for DevPackageView {
    type Patch = DevPackageViewPatch;

    fn merge(&mut self, patch: DevPackageViewPatch) {
        if let Some(selected_release) = patch.selected_release {
            self.selected_release = selected_release;
        }
        if let Some(show_archived) = patch.show_archived {
            self.show_archived = show_archived;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevPackageRelease {
    pub id: u64,
    pub package_name: String,
    pub version: String,
    pub architectures: Vec<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub description: String,
    pub created_at: u64,
    pub expires_at: Option<u64>,
}
