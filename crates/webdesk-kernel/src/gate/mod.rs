//! Capability gate.
//!
//! Every request frame a process sends passes through [`handle_frame`]
//! exactly once. The gate resolves the sender from the surface id stamped
//! on the frame, checks the app's permission for the `storage` and
//! `registry` families, runs the method and sends exactly one reply. Any
//! other namespace except `shell` is an unknown method. Frames that cannot
//! be answered safely are dropped without a reply:
//!
//! - payloads that do not decode as protocol frames,
//! - reply-role frames (the host never issues calls),
//! - frames from a surface that no live window owns.
//!
//! The gate holds no state of its own.

mod registry;
mod shell;
mod storage;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};
use webdesk_apps::{AppManifest, Permission};
use webdesk_core::{ErrorCode, RpcError};
use webdesk_rpc::{Frame, InboundFrame, Request};

use crate::desktop::Desktop;

/// Namespace whose methods need no permission.
const SHELL_NAMESPACE: &str = "shell";

/// Handle one inbound frame. Returns whether a reply was delivered.
pub(crate) async fn handle_frame(desk: &mut Desktop, inbound: InboundFrame) -> bool {
    let request = match Frame::decode(&inbound.payload) {
        Ok(Frame::Request(request)) => request,
        Ok(Frame::Reply(reply)) => {
            trace!(surface_id = %inbound.source, call_id = %reply.id, "Reply-role frame from process dropped");
            return false;
        },
        Err(e) => {
            debug!(surface_id = %inbound.source, error = %e, "Malformed frame dropped");
            return false;
        },
    };

    let Some(window) = desk.windows().window_for_surface(inbound.source) else {
        debug!(
            surface_id = %inbound.source,
            call_id = %request.id,
            "Frame from unknown surface dropped"
        );
        return false;
    };
    let app = Arc::clone(window.app());
    let link = window.link().clone();
    let window_id = window.id();

    let outcome = dispatch(desk, &app, &request).await;
    match &outcome {
        Ok(_) => trace!(app_id = %app.id, call_id = %request.id, method = %request.method, "Call served"),
        Err(e) if matches!(e.code, ErrorCode::PermissionDenied | ErrorCode::QuotaExceeded) => {
            warn!(app_id = %app.id, window_id = %window_id, method = %request.method, code = %e.code, "Call refused");
        },
        Err(e) => {
            debug!(app_id = %app.id, method = %request.method, error = %e, "Call failed");
        },
    }

    link.send(&Frame::reply(request.id, outcome))
}

async fn dispatch(
    desk: &mut Desktop,
    app: &AppManifest,
    request: &Request,
) -> Result<Value, RpcError> {
    match request.namespace() {
        Some(SHELL_NAMESPACE) => shell::call(desk, app, request),
        Some("storage") => {
            authorize(app, &Permission::Storage)?;
            storage::call(desk, app, request).await
        },
        Some("registry") => {
            authorize(app, &Permission::Registry)?;
            registry::call(desk, request).await
        },
        _ => Err(RpcError::unknown_method(&request.method)),
    }
}

/// Check that `app` holds `required`.
fn authorize(app: &AppManifest, required: &Permission) -> Result<(), RpcError> {
    if app.has_permission(required) {
        Ok(())
    } else {
        Err(RpcError::new(
            ErrorCode::PermissionDenied,
            format!("App \"{}\" lacks permission \"{required}\"", app.id),
        ))
    }
}

/// A required string parameter.
fn str_param<'a>(request: &'a Request, name: &str) -> Result<&'a str, RpcError> {
    request
        .param(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(&request.method, format!("\"{name}\" must be a string")))
}
