//! Procedure registration.
//!
//! Procedures are named `namespace.procedureName` and served as
//! `POST /namespace/procedure-name` with a JSON body. Every registered name is
//! listed by the definition route.

use std::collections::BTreeMap;

use axum::{handler::Handler, routing::post, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProcedureDef {
    pub transport: &'static str,
    pub path: String,
    pub method: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Definition {
    pub procedures: BTreeMap<String, ProcedureDef>,
}

/// `flows.createFlow` -> `/flows/create-flow`, `auth.verify-email` -> `/auth/verify-email`.
pub fn procedure_path(name: &str) -> String {
    let mut path = String::with_capacity(name.len() + 8);
    for segment in name.split('.') {
        path.push('/');
        for (i, c) in segment.chars().enumerate() {
            if c.is_ascii_uppercase() {
                if i > 0 && !path.ends_with('-') {
                    path.push('-');
                }
                path.push(c.to_ascii_lowercase());
            } else {
                path.push(c);
            }
        }
    }
    path
}

pub struct RpcRouter {
    router: Router<AppState>,
    definition: Definition,
}

impl Default for RpcRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcRouter {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            definition: Definition::default(),
        }
    }

    pub fn procedure<H, T>(mut self, name: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let path = procedure_path(name);
        self.router = self.router.route(&path, post(handler));
        self.definition.procedures.insert(
            name.to_string(),
            ProcedureDef {
                transport: "http",
                path,
                method: "post",
            },
        );
        self
    }

    pub fn merge(mut self, other: RpcRouter) -> Self {
        self.router = self.router.merge(other.router);
        self.definition
            .procedures
            .extend(other.definition.procedures);
        self
    }

    pub fn into_parts(self) -> (Router<AppState>, Definition) {
        (self.router, self.definition)
    }
}
