//! `storage.*`: the calling app's own namespace, metered against its quota.

use serde_json::Value;
use webdesk_apps::AppManifest;
use webdesk_core::RpcError;
use webdesk_rpc::Request;

use super::str_param;
use crate::desktop::Desktop;

pub(super) async fn call(
    desk: &Desktop,
    app: &AppManifest,
    request: &Request,
) -> Result<Value, RpcError> {
    let storage = desk.app_storage(&app.id)?;

    match request.method.as_str() {
        "storage.set" => {
            let key = str_param(request, "key")?;
            let value = request.param("value").cloned().unwrap_or(Value::Null);
            storage.set(key, &value).await?;
            Ok(Value::Bool(true))
        },
        "storage.get" => {
            let key = str_param(request, "key")?;
            let fallback = request.param("fallback").cloned().unwrap_or(Value::Null);
            Ok(storage.get(key, fallback).await?)
        },
        "storage.list" => {
            let keys = storage.list().await?;
            Ok(Value::from(keys))
        },
        "storage.remove" => {
            let key = str_param(request, "key")?;
            storage.remove(key).await?;
            Ok(Value::Bool(true))
        },
        "storage.quota" => {
            let report = storage.quota().await?;
            serde_json::to_value(report).map_err(|e| RpcError::internal(e.to_string()))
        },
        _ => Err(RpcError::unknown_method(&request.method)),
    }
}
