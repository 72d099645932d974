use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["postwatch"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["postwatch", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn ingest_query_uses_default_filters() {
    let cli = Cli::try_parse_from(["postwatch", "ingest", "query", "rust hiring"]).unwrap();
    let Some(Commands::Ingest {
        command:
            IngestCommands::Query {
                query,
                content_type,
                time_range,
                location,
                limit,
            },
    }) = cli.command
    else {
        panic!("expected ingest query");
    };
    assert_eq!(query, "rust hiring");
    assert_eq!(content_type, postwatch_core::ContentType::Posts);
    assert_eq!(time_range, postwatch_core::TimeRange::Week);
    assert_eq!(location, "any");
    assert_eq!(limit, 20);
}

#[test]
fn ingest_query_rejects_unknown_time_range() {
    let result = Cli::try_parse_from([
        "postwatch",
        "ingest",
        "query",
        "rust",
        "--time-range",
        "fortnight",
    ]);
    assert!(result.is_err());
}

#[test]
fn ingest_profile_takes_url_and_limit() {
    let cli = Cli::try_parse_from([
        "postwatch",
        "ingest",
        "profile",
        "https://www.linkedin.com/in/janedoe",
        "--limit",
        "5",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            command: IngestCommands::Profile { limit: 5, .. }
        })
    ));
}

#[test]
fn search_defaults_to_date_sort_first_page() {
    let cli = Cli::try_parse_from(["postwatch", "search", "ownership"]).unwrap();
    let Some(Commands::Search {
        text,
        author,
        sort,
        page,
        per_page,
        run,
    }) = cli.command
    else {
        panic!("expected search");
    };
    assert_eq!(text.as_deref(), Some("ownership"));
    assert!(author.is_none());
    assert_eq!(sort, SortOrder::Date);
    assert_eq!(page, 1);
    assert_eq!(per_page, 20);
    assert!(run.is_none());
}

#[test]
fn search_accepts_run_scope() {
    let id = "6f1c2a7e-0d4b-4c55-9a51-2f6c1d8e9b10";
    let cli = Cli::try_parse_from(["postwatch", "search", "--run", id, "--sort", "reactions"])
        .unwrap();
    let Some(Commands::Search { text, sort, run, .. }) = cli.command else {
        panic!("expected search");
    };
    assert!(text.is_none());
    assert_eq!(sort, SortOrder::Reactions);
    assert_eq!(run.map(|r| r.to_string()).as_deref(), Some(id));
}

#[test]
fn saved_create_can_start_disabled() {
    let cli = Cli::try_parse_from([
        "postwatch",
        "saved",
        "create",
        "Rust jobs",
        "rust hiring",
        "--schedule-hours",
        "6",
        "--disabled",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Saved {
            command: SavedCommands::Create {
                schedule_hours: 6,
                disabled: true,
                max_posts: 20,
                ..
            }
        })
    ));
}

#[test]
fn saved_update_leaves_unset_fields_empty() {
    let cli =
        Cli::try_parse_from(["postwatch", "saved", "update", "3", "--enabled", "false"]).unwrap();
    let Some(Commands::Saved {
        command:
            SavedCommands::Update {
                id,
                name,
                enabled,
                max_posts,
                ..
            },
    }) = cli.command
    else {
        panic!("expected saved update");
    };
    assert_eq!(id, 3);
    assert!(name.is_none());
    assert!(max_posts.is_none());
    assert_eq!(enabled, Some(false));
}

#[test]
fn monitor_watch_once_flag() {
    let cli = Cli::try_parse_from(["postwatch", "monitor", "watch", "--once"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Monitor {
            command: MonitorCommands::Watch { once: true }
        })
    ));
}

#[test]
fn monitor_unread_defaults_to_a_day() {
    let cli = Cli::try_parse_from(["postwatch", "monitor", "unread"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Monitor {
            command: MonitorCommands::Unread { hours: 24 }
        })
    ));
}

#[test]
fn truncate_collapses_whitespace_and_shortens() {
    assert_eq!(truncate("a  b\nc", 10), "a b c");
    assert_eq!(truncate("abcdefghij", 4), "abcd...");
}

#[test]
fn missing_time_renders_dash() {
    assert_eq!(fmt_time(None), "\u{2014}");
}
