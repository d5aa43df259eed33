use std::collections::HashMap;

use serde::Deserialize;

use crate::api::{ApiClient, ApiConfig};
use crate::wizard::{WizardInstance, WizardKind};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
    Parent,
    Student,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            "parent" => Some(Self::Parent),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Parent => "parent",
            Self::Student => "student",
        }
    }
}

/// Signed-in user as the UI reported it. The token is held in memory only;
/// issuing and persisting credentials is the auth layer's job, not ours.
pub struct Session {
    pub role: Role,
    pub token: Option<String>,
    pub client: ApiClient,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

pub struct AppState {
    pub config: ApiConfig,
    pub session: Option<Session>,
    pub wizards: HashMap<WizardKind, WizardInstance>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            session: None,
            wizards: HashMap::new(),
        }
    }
}
