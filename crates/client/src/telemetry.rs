//! Sentry context for shop actions.
//!
//! Stores call these so error reports carry the signed-in user and the
//! trail of actions that led up to a failure. With no Sentry client bound
//! every call is a no-op.

use emporium_core::User;

/// Associate subsequent Sentry events with `user`.
pub fn set_sentry_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.to_string()),
            ..Default::default()
        }));
    });
}

/// Stop associating events with a user. Called on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a store action as a breadcrumb.
///
/// Failed actions are recorded at warning level with the message that was
/// exposed to the user.
pub fn action_breadcrumb(category: &str, action: &str, failure: Option<&str>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(action.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(message) = failure {
        breadcrumb.level = sentry::Level::Warning;
        breadcrumb.data.insert(
            "error".to_string(),
            serde_json::Value::String(message.to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
