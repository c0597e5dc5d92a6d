use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{read, required_str, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, User};
use crate::store::Collection;
use serde_json::json;
use uuid::Uuid;

fn parse_role(value: Option<&serde_json::Value>) -> Option<Role> {
    serde_json::from_value(value?.clone()).ok()
}

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let users: Vec<User> = match read(store, Collection::Users, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "users": users }))
}

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let username = match required_str(req, "username") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if name.is_empty() || username.is_empty() {
        return err(&req.id, "bad_params", "name and username are required", None);
    }
    let Some(role) = parse_role(req.params.get("role")) else {
        return err(
            &req.id,
            "bad_params",
            "role must be one of: ADMIN, TEACHER, STUDENT",
            None,
        );
    };
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string());

    let mut users: Vec<User> = match read(store, Collection::Users, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if users.iter().any(|u| u.username == username) {
        return err(
            &req.id,
            "bad_params",
            "username already taken",
            Some(json!({ "username": username })),
        );
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username,
        password,
        name,
        role,
        student_id: None,
        last_login: None,
    };
    users.push(user.clone());
    if let Err(resp) = write(store, Collection::Users, &users, req) {
        return resp;
    }
    ok(&req.id, json!({ "userId": user.id }))
}

fn handle_users_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let user_id = match required_str(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };

    let mut users: Vec<User> = match read(store, Collection::Users, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
        return err(&req.id, "not_found", "user not found", None);
    };

    if let Some(v) = patch.get("name").and_then(|v| v.as_str()) {
        user.name = v.to_string();
    }
    if let Some(v) = patch.get("username").and_then(|v| v.as_str()) {
        user.username = v.to_string();
    }
    if let Some(v) = patch.get("password").and_then(|v| v.as_str()) {
        user.password = Some(v.to_string());
    }
    if let Some(role) = parse_role(patch.get("role")) {
        user.role = role;
    }

    if let Err(resp) = write(store, Collection::Users, &users, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let user_id = match required_str(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut users: Vec<User> = match read(store, Collection::Users, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let before = users.len();
    users.retain(|u| u.id != user_id);
    if users.len() == before {
        return err(&req.id, "not_found", "user not found", None);
    }
    if let Err(resp) = write(store, Collection::Users, &users, req) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.list" => Some(handle_users_list(state, req)),
        "users.create" => Some(handle_users_create(state, req)),
        "users.update" => Some(handle_users_update(state, req)),
        "users.delete" => Some(handle_users_delete(state, req)),
        _ => None,
    }
}
