//! Login command handler.

use fritzbox_core::Connection;
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LoginResult {
    host: String,
    username: String,
    authenticated: bool,
}

pub async fn handle(connection: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    connection.login().await?;

    let config = connection.config();
    let result = LoginResult {
        host: config.url.to_string(),
        username: config.credentials.username.clone(),
        authenticated: true,
    };

    let out = output::render_single(
        &global.output,
        &result,
        |r| {
            if r.username.is_empty() {
                format!("Logged in to {}", r.host)
            } else {
                format!("Logged in to {} as {}", r.host, r.username)
            }
        },
        |_| "ok".into(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
