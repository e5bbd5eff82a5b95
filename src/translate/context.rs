//! Per-operation translation state.
//!
//! One context exists for the lifetime of one translation and is never
//! shared: it allocates collision-free parameter keys and accumulates the
//! parameter map. The type model it borrows is immutable.

use serde_json::{Map, Value};

use crate::auth::{AuthContext, AUTH_PARAM};
use crate::type_model::TypeModel;

pub struct TranslationContext<'a> {
    pub model: &'a TypeModel,
    pub auth: AuthContext,
    params: Map<String, Value>,
    auth_bound: bool,
}

impl<'a> TranslationContext<'a> {
    pub fn new(model: &'a TypeModel, auth: AuthContext) -> Self {
        TranslationContext {
            model,
            auth,
            params: Map::new(),
            auth_bound: false,
        }
    }

    /// Insert a parameter under `key`, appending a numeric disambiguator if
    /// the key is already taken (the same field can legitimately recur, for
    /// instance inside OR branches). Returns the key actually used.
    pub fn add_param(&mut self, key: impl Into<String>, value: Value) -> String {
        let base = key.into();
        let mut key = base.clone();
        let mut n = 2;
        while self.params.contains_key(&key) {
            key = format!("{}{}", base, n);
            n += 1;
        }
        self.params.insert(key.clone(), value);
        key
    }

    /// Bind the `$auth` parameter once per statement.
    pub fn bind_auth(&mut self) {
        if !self.auth_bound {
            self.params
                .insert(AUTH_PARAM.to_string(), self.auth.to_param());
            self.auth_bound = true;
        }
    }

    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }
}
