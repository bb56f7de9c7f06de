//! `registry.*`: listing, installing and uninstalling apps.

use serde_json::Value;
use webdesk_apps::AppManifest;
use webdesk_core::RpcError;
use webdesk_rpc::Request;

use super::str_param;
use crate::desktop::Desktop;

pub(super) async fn call(desk: &mut Desktop, request: &Request) -> Result<Value, RpcError> {
    match request.method.as_str() {
        "registry.list" => {
            let apps = desk.registry().list();
            let records: Vec<&AppManifest> = apps.iter().map(AsRef::as_ref).collect();
            serde_json::to_value(records).map_err(|e| RpcError::internal(e.to_string()))
        },
        "registry.install" => {
            let manifest = request.param("manifest").unwrap_or(&Value::Null);
            desk.install_value(manifest).await?;
            Ok(Value::Bool(true))
        },
        "registry.uninstall" => {
            let app_id = str_param(request, "appId")?;
            desk.uninstall(app_id).await?;
            Ok(Value::Bool(true))
        },
        _ => Err(RpcError::unknown_method(&request.method)),
    }
}
