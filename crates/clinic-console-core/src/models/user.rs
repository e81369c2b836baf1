//! User account models.

use serde::{Deserialize, Serialize};

use super::wire;
use crate::entity::{Draft, Entity, PatientDirectory, RecordId, SortField, SortKey};
use crate::screen::{FieldErrors, FormError};

/// Staff role as stored by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "administratif")]
    Administrative,
    #[default]
    #[serde(rename = "medcin")]
    Physician,
    #[serde(rename = "secretaire")]
    Secretary,
    #[serde(rename = "infirmier")]
    Nurse,
    #[serde(rename = "technicien")]
    Technician,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Physician,
        Role::Nurse,
        Role::Secretary,
        Role::Administrative,
        Role::Technician,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrative => "administratif",
            Role::Physician => "medcin",
            Role::Secretary => "secretaire",
            Role::Nurse => "infirmier",
            Role::Technician => "technicien",
        }
    }

    /// Exact wire value or English label, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Role::ALL.into_iter().find(|role| {
            role.as_str().eq_ignore_ascii_case(raw) || role.label().eq_ignore_ascii_case(raw)
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Administrative => "Administrative",
            Role::Physician => "Physician",
            Role::Secretary => "Secretary",
            Role::Nurse => "Nurse",
            Role::Technician => "Technician",
        }
    }
}

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(deserialize_with = "wire::id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::text")]
    pub name: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub email: String,
    /// Raw role string; may be outside [`Role`]
    #[serde(default, deserialize_with = "wire::text")]
    pub role: String,
}

impl User {
    pub fn parsed_role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    /// English label, or the raw value for roles this client doesn't know.
    pub fn role_label(&self) -> String {
        self.parsed_role()
            .map(|r| r.label().to_string())
            .unwrap_or_else(|| self.role.clone())
    }
}

/// Sortable user columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Name,
    Email,
    Role,
}

impl SortField for UserField {
    const ALL: &'static [Self] = &[
        UserField::Id,
        UserField::Name,
        UserField::Email,
        UserField::Role,
    ];

    fn name(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Name => "name",
            UserField::Email => "email",
            UserField::Role => "role",
        }
    }
}

/// User form state. The password is write-only and left out of the
/// payload when blank, so editing keeps the stored one.
///
/// `role` holds the wire value. Edits keep whatever the server sent, even
/// roles this client doesn't know; only values typed into the form are
/// checked against [`Role`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserDraft {
    #[serde(skip_serializing)]
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub role: String,
}

impl Default for UserDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            role: Role::default().as_str().to_string(),
        }
    }
}

impl Draft for UserDraft {
    const FIELDS: &'static [&'static str] = &["name", "email", "password", "role"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn get(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "email" => Some(self.email.clone()),
            "password" => Some(self.password.clone()),
            "role" => Some(self.role.clone()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        match field {
            "name" => self.name = value.to_string(),
            "email" => self.email = value.trim().to_string(),
            "password" => self.password = value.to_string(),
            "role" => {
                let role = Role::parse(value).ok_or_else(|| FormError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                })?;
                self.role = role.as_str().to_string();
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Name is required");
        if errors.require("email", &self.email, "Email is required") && !self.email.contains('@') {
            errors.insert("email", "Email address is invalid");
        }
        if self.is_new() {
            errors.require("password", &self.password, "Password is required");
        }
        errors
    }
}

impl Entity for User {
    type Draft = UserDraft;
    type Field = UserField;

    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "user";
    const COLUMNS: &'static [&'static str] = &["ID", "Name", "Email", "Role"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self, _patients: &PatientDirectory) -> Vec<String> {
        vec![self.name.clone(), self.email.clone(), self.role_label()]
    }

    fn sort_key(&self, field: UserField, _patients: &PatientDirectory) -> SortKey {
        match field {
            UserField::Id => SortKey::Number(self.id as f64),
            UserField::Name => SortKey::text(&self.name),
            UserField::Email => SortKey::text(&self.email),
            UserField::Role => SortKey::Text(self.role_label()),
        }
    }

    fn to_draft(&self) -> UserDraft {
        UserDraft {
            id: Some(self.id),
            name: self.name.clone(),
            email: self.email.clone(),
            password: String::new(),
            role: self.role.clone(),
        }
    }

    fn cells(&self, _patients: &PatientDirectory) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.role_label(),
        ]
    }
}
