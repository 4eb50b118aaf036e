use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["catsync"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_sync_with_supplier() {
    let cli = Cli::try_parse_from(["catsync", "sync", "--supplier", "chevalier"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            ref supplier,
            dry_run: false
        }) if supplier == "chevalier"
    ));
}

#[test]
fn parses_sync_dry_run() {
    let cli = Cli::try_parse_from(["catsync", "sync", "--supplier", "deerhunter", "--dry-run"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sync { dry_run: true, .. })
    ));
}

#[test]
fn sync_requires_supplier() {
    assert!(Cli::try_parse_from(["catsync", "sync"]).is_err());
}

#[test]
fn parses_state_show() {
    let cli = Cli::try_parse_from(["catsync", "state", "show", "--supplier", "chevalier"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::State {
            command: StateCommands::Show { ref supplier }
        }) if supplier == "chevalier"
    ));
}

#[test]
fn parses_state_reset_progress() {
    let cli = Cli::try_parse_from([
        "catsync",
        "state",
        "reset-progress",
        "--supplier",
        "deerhunter",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::State {
            command: StateCommands::ResetProgress { ref supplier }
        }) if supplier == "deerhunter"
    ));
}

#[test]
fn unknown_state_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["catsync", "state", "wipe", "--supplier", "x"]).is_err());
}
