use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // PGW_MP_ACCESS_TOKEN is deliberately absent
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "PGW_HOST",
        "PGW_PORT",
        "PGW_DATABASE_URL",
        "PGW_MP_API_URL",
        "PGW_GATEWAY_TIMEOUT",
        "PGW_UNPAID_ORDER_TIMEOUT",
        "PGW_EXPIRY_CHECK_INTERVAL",
        "PGW_PAYER_EMAIL_PLACEHOLDER",
        "PGW_ORDER_DESCRIPTION_PREFIX",
        "PGW_CORS_ALLOWED_ORIGIN",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
