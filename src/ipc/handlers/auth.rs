use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{now_iso, read, required_str, store, write};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, Student, User};
use crate::store::Collection;
use serde_json::json;

fn without_password(user: &User) -> User {
    let mut out = user.clone();
    out.password = None;
    out
}

/// Staff sign-in. A plaintext equality check against the stored user list,
/// exactly as the browser app does it; this is record-keeping convenience,
/// not an authentication boundary.
fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let username = match required_str(req, "username") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut users: Vec<User> = match read(store, Collection::Users, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let found = users.iter_mut().find(|u| {
        u.username == username
            && u.password.as_deref() == Some(password.as_str())
            && matches!(u.role, Role::Admin | Role::Teacher)
    });
    let Some(user) = found else {
        return err(
            &req.id,
            "invalid_credentials",
            "username or password incorrect",
            None,
        );
    };

    user.last_login = Some(now_iso());
    let logged_in = without_password(user);
    if let Err(resp) = write(store, Collection::Users, &users, req) {
        return resp;
    }

    ok(&req.id, json!({ "user": logged_in }))
}

/// Students sign in with their school-assigned number alone and get an
/// ephemeral STUDENT user; nothing is persisted.
fn handle_student_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let student_no = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let students: Vec<Student> = match read(store, Collection::Students, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(student) = students.iter().find(|s| s.student_id == student_no) else {
        return err(&req.id, "not_found", "student number not found", None);
    };

    let user = User {
        id: student.id.clone(),
        username: student.student_id.clone(),
        password: None,
        name: student.name.clone(),
        role: Role::Student,
        student_id: Some(student.student_id.clone()),
        last_login: None,
    };
    ok(&req.id, json!({ "user": user }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.studentLogin" => Some(handle_student_login(state, req)),
        _ => None,
    }
}
