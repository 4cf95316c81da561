use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

tokio::task_local! {
    static REQUEST_CONTEXT: RefCell<RequestContext>;
}

/// Ambient per-request fields carried in task-local storage.
///
/// A field that is `None` has not been set; setting a field to an empty
/// string keeps it out of [`current_request_context`] as well, so empty
/// values are never shipped.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: Option<String>,
    pub trace_id: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
    pub user_id: Option<String>,
}

/// Run `fut` with a fresh, empty request context.
///
/// Each scope owns its own context; concurrent scopes never observe each
/// other's fields. Typically wraps one request's handler future.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_CONTEXT
        .scope(RefCell::new(RequestContext::default()), fut)
        .await
}

/// Merge `update` into the current context: `Some` fields overwrite,
/// `None` fields leave the existing value intact. Outside a scope this
/// is a no-op.
pub fn update_request_context(update: RequestContext) {
    let _ = REQUEST_CONTEXT.try_with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if let Some(request_id) = update.request_id {
            ctx.request_id = Some(request_id);
        }
        if let Some(trace_id) = update.trace_id {
            ctx.trace_id = Some(trace_id);
        }
        if let Some(path) = update.path {
            ctx.path = Some(path);
        }
        if let Some(method) = update.method {
            ctx.method = Some(method);
        }
        if let Some(user_id) = update.user_id {
            ctx.user_id = Some(user_id);
        }
    });
}

/// Clear every field of the current context. No-op outside a scope.
pub fn reset_request_context() {
    let _ = REQUEST_CONTEXT.try_with(|ctx| {
        *ctx.borrow_mut() = RequestContext::default();
    });
}

/// Snapshot the non-empty context fields as a string map.
///
/// Returns an empty map outside a scope. Read synchronously at the
/// emission call site so the snapshot reflects the emitting task, not
/// whichever request is active when the batch is flushed later.
pub fn current_request_context() -> BTreeMap<String, String> {
    REQUEST_CONTEXT
        .try_with(|ctx| {
            let ctx = ctx.borrow();
            let mut fields = BTreeMap::new();
            let entries = [
                ("request_id", &ctx.request_id),
                ("trace_id", &ctx.trace_id),
                ("path", &ctx.path),
                ("method", &ctx.method),
                ("user_id", &ctx.user_id),
            ];
            for (key, value) in entries {
                if let Some(value) = value {
                    if !value.is_empty() {
                        fields.insert(key.to_string(), value.clone());
                    }
                }
            }
            fields
        })
        .unwrap_or_default()
}
