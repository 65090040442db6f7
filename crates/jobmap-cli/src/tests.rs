use super::*;

#[test]
fn parses_scan_with_job_ids() {
    let cli = Cli::try_parse_from(["jobmap", "scan", "--job-id", "1", "2"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::Scan { page, job_id } => {
            assert!(page.is_none());
            assert_eq!(job_id, vec!["1", "2"]);
        }
        other => panic!("expected scan, got {other:?}"),
    }
}

#[test]
fn parses_scan_with_page_snapshot() {
    let cli = Cli::try_parse_from(["jobmap", "scan", "--page", "page.json"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Scan { page: Some(_), ref job_id } if job_id.is_empty()
    ));
}

#[test]
fn scan_requires_page_or_job_ids() {
    assert!(Cli::try_parse_from(["jobmap", "scan"]).is_err());
}

#[test]
fn scan_rejects_page_and_job_ids_together() {
    assert!(Cli::try_parse_from(["jobmap", "scan", "--page", "p.json", "--job-id", "1"]).is_err());
}

#[test]
fn list_defaults_to_all_types_sorted_by_distance() {
    let cli = Cli::try_parse_from(["jobmap", "list"]).expect("expected valid cli args");
    let Commands::List { filter } = cli.command else {
        panic!("expected list");
    };
    assert_eq!(filter.sort, SortOrder::Distance);
    assert_eq!(filter.job_filter(), JobFilter::default());
}

#[test]
fn list_filter_flags_map_to_job_filter() {
    let cli = Cli::try_parse_from([
        "jobmap",
        "list",
        "--no-remote",
        "--no-hybrid",
        "--search",
        "rust",
        "--sort",
        "date",
    ])
    .expect("expected valid cli args");
    let Commands::List { filter } = cli.command else {
        panic!("expected list");
    };
    assert_eq!(filter.sort, SortOrder::Date);
    let f = filter.job_filter();
    assert!(f.on_site);
    assert!(!f.hybrid);
    assert!(!f.remote);
    assert_eq!(f.search.as_deref(), Some("rust"));
}

#[test]
fn list_rejects_unknown_sort() {
    assert!(Cli::try_parse_from(["jobmap", "list", "--sort", "salary"]).is_err());
}

#[test]
fn export_requires_out() {
    assert!(Cli::try_parse_from(["jobmap", "export"]).is_err());
    let cli = Cli::try_parse_from(["jobmap", "export", "--out", "jobs.csv", "--sort", "company"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Export { ref out, ref filter }
            if out.as_os_str() == "jobs.csv" && filter.sort == SortOrder::Company
    ));
}

#[test]
fn locate_set_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from(["jobmap", "locate", "set", "-33.87", "-70.6"])
        .expect("expected valid cli args");
    match cli.command {
        Commands::Locate {
            command: LocateCommands::Set { lat, lng },
        } => {
            assert!((lat + 33.87).abs() < f64::EPSILON);
            assert!((lng + 70.6).abs() < f64::EPSILON);
        }
        other => panic!("expected locate set, got {other:?}"),
    }
}

#[test]
fn parses_clear_commands() {
    let cli = Cli::try_parse_from(["jobmap", "clear-jobs"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::ClearJobs));
    let cli = Cli::try_parse_from(["jobmap", "clear-cache"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::ClearCache));
}

#[test]
fn route_requires_job_id() {
    assert!(Cli::try_parse_from(["jobmap", "route"]).is_err());
    let cli = Cli::try_parse_from(["jobmap", "route", "--job-id", "42"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Route { ref job_id } if job_id == "42"));
}

#[test]
fn load_snapshot_reads_page_file() {
    let dir = std::env::temp_dir().join(format!("jobmap-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("page.json");
    std::fs::write(&path, r#"{"jobIds": ["7", "8"], "companyNames": {"7": "Acme"}}"#).unwrap();

    let snapshot = scan::load_snapshot(&path).unwrap();
    assert_eq!(snapshot.job_ids, vec!["7", "8"]);

    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(scan::load_snapshot(&path).is_err());
    std::fs::remove_dir_all(&dir).ok();
}
