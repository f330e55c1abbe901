/// Update model fields and render only if one of them changed.
///
/// ```ignore
/// update_field!(model.os_updates, Some(info))
/// update_field!(model.is_connected, true; model.reconnect_timer, None)
/// ```
#[macro_export]
macro_rules! update_field {
    ($($model_field:expr, $value:expr);+ $(;)?) => {{
        let mut changed = false;
        $(
            let value = $value;
            if $model_field != value {
                $model_field = value;
                changed = true;
            }
        )+
        if changed {
            crux_core::render::render()
        } else {
            crux_core::Command::done()
        }
    }};
}

// Used by the http macros through `$crate::macros`
pub use crate::http_helpers::{process_json_response, process_status_response, process_text_response};

/// Send a device request and deliver the processed result as
/// `Event::$domain($domain_event::$response_event(result))`.
///
/// The body is read as `json`, as a plain `text` value, or ignored (`status`).
///
/// ```ignore
/// http_request!(get json, Upgrade, UpgradeEvent, &build_url("/os-updates"), OsUpdatesResponse, OsUpdateInfo)
/// http_request!(get text, Upgrade, UpgradeEvent, &build_url("/available-space"), AvailableSpaceResponse, u64)
/// http_request!(post status, Upgrade, UpgradeEvent, &build_url("/restart-web-portal-service"), RestartServiceResponse, ())
/// ```
#[macro_export]
macro_rules! http_request {
    (@process json) => { $crate::macros::process_json_response };
    (@process text) => { $crate::macros::process_text_response };
    (@process status) => { $crate::macros::process_status_response };

    ($method:ident $body:ident, $domain:ident, $domain_event:ident, $url:expr, $response_event:ident, $response_type:ty) => {
        $crate::HttpCmd::$method($url).build().then_send(|result| {
            let process = $crate::http_request!(@process $body);
            let event_result: Result<$response_type, String> =
                process(stringify!($response_event), result);
            $crate::events::Event::$domain($crate::events::$domain_event::$response_event(
                event_result,
            ))
        })
    };
}
