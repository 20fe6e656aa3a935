pub mod output;
pub mod request;
pub mod session;
pub mod shell;

use opsdesk_interaction::ApiError;

/// One-line follow-up advice for errors the user can act on.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<ApiError>()? {
        ApiError::Unauthorized => Some("Your session has ended. Run `opsdesk login` to sign in again."),
        ApiError::Transport(_) => Some("Check that the backend is running and api.base_url in config.toml."),
        ApiError::UnsupportedContentType(_) => Some("Retry with `--kind binary` or `--kind text`."),
        _ => None,
    }
}
