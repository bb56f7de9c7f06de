//! `shell.*`: host utilities open to every app.

use serde_json::Value;
use tracing::info;
use webdesk_apps::AppManifest;
use webdesk_core::RpcError;
use webdesk_events::ShellEvent;
use webdesk_rpc::Request;

use crate::desktop::Desktop;

pub(super) fn call(desk: &Desktop, app: &AppManifest, request: &Request) -> Result<Value, RpcError> {
    let event = match request.method.as_str() {
        "shell.alert" => ShellEvent::Alert {
            app_id: app.id.clone(),
            message: text_param(request, "message"),
        },
        "shell.openUrl" => {
            let url = text_param(request, "url");
            info!(app_id = %app.id, url = %url, "App requested URL");
            ShellEvent::OpenUrl {
                app_id: app.id.clone(),
                url,
            }
        },
        _ => return Err(RpcError::unknown_method(&request.method)),
    };
    desk.events().publish(event);
    Ok(Value::Bool(true))
}

/// A parameter rendered as text: strings as is, absent or null as empty,
/// anything else as its JSON text.
fn text_param(request: &Request, name: &str) -> String {
    match request.param(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
