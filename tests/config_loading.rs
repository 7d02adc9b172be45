// tests/config_loading.rs

use std::fs;
use std::num::NonZeroUsize;
use std::time::Duration;

use jobrun::config::{ConfigFile, load_and_validate, load_from_str};
use jobrun::errors::JobrunError;
use jobrun::plan::{Plan, PlanOverrides};
use jobrun::types::{KillSignal, parse_duration};
use jobrun_test_utils::builders::{ConfigFileBuilder, JobConfigBuilder};

const SAMPLE: &str = r#"
[config]
concurrency = 3
drain_window = "250ms"

[[job]]
name = "build"
cmd = "dotnet build \"My App.sln\""
timeout = "10m"
kill_signal = "SIGINT"
force_kill_after = "2s"

[[job]]
name = "test"
cmd = "dotnet test"
args = ["--no-build", "--logger", "console;verbosity=minimal"]
env = { DOTNET_NOLOGO = "1" }
retries = 2
retry_backoff = "1s"
suppress_output = true
"#;

fn validated(contents: &str) -> Result<ConfigFile, JobrunError> {
    ConfigFile::try_from(load_from_str(contents)?)
}

fn config_error(contents: &str) -> String {
    match validated(contents) {
        Err(JobrunError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn sample_file_resolves_every_field() {
    let cfg = validated(SAMPLE).unwrap();

    assert_eq!(cfg.settings.concurrency.get(), 3);
    assert_eq!(cfg.settings.drain_window, Duration::from_millis(250));
    assert_eq!(cfg.job_names().collect::<Vec<_>>(), vec!["build", "test"]);

    let build = cfg.job("build").unwrap();
    assert_eq!(build.exe, "dotnet");
    assert_eq!(build.args, vec!["build", "My App.sln"]);
    assert_eq!(build.timeout, Some(Duration::from_secs(600)));
    assert_eq!(build.kill_signal, KillSignal::Interrupt);
    assert_eq!(build.force_kill_after, Duration::from_secs(2));
    assert_eq!(build.retry.attempts, 1);
    assert!(!build.suppress_output);

    let test = cfg.job("test").unwrap();
    assert_eq!(
        test.args,
        vec!["test", "--no-build", "--logger", "console;verbosity=minimal"]
    );
    assert_eq!(test.env.get("DOTNET_NOLOGO").map(String::as_str), Some("1"));
    assert_eq!(test.kill_signal, KillSignal::Terminate);
    assert_eq!(test.force_kill_after, Duration::from_secs(5));
    assert_eq!(test.retry.attempts, 3);
    assert_eq!(test.retry.backoff, Duration::from_secs(1));
    assert!(test.suppress_output);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = validated("[[job]]\nname = \"a\"\ncmd = \"true\"\ncommand = \"oops\"\n").unwrap_err();
    assert!(matches!(err, JobrunError::TomlError(_)), "{err:?}");

    let err = validated("[config]\nparallel = 2\n[[job]]\nname = \"a\"\ncmd = \"true\"\n").unwrap_err();
    assert!(matches!(err, JobrunError::TomlError(_)), "{err:?}");
}

#[test]
fn bad_kill_signal_is_a_parse_error() {
    let err = validated("[[job]]\nname = \"a\"\ncmd = \"true\"\nkill_signal = \"SIGFOO\"\n").unwrap_err();
    assert!(matches!(err, JobrunError::TomlError(_)), "{err:?}");
    assert!(err.to_string().contains("invalid kill_signal"), "{err}");
}

#[test]
fn empty_file_needs_at_least_one_job() {
    assert!(config_error("").contains("at least one"));
}

#[test]
fn duplicate_names_are_rejected() {
    let msg = config_error("[[job]]\nname = \"a\"\ncmd = \"true\"\n[[job]]\nname = \"a\"\ncmd = \"false\"\n");
    assert!(msg.contains("more than once"), "{msg}");
}

#[test]
fn blank_name_is_rejected() {
    let msg = config_error("[[job]]\nname = \"  \"\ncmd = \"true\"\n");
    assert!(msg.contains("non-empty"), "{msg}");
}

#[test]
fn zero_concurrency_is_rejected() {
    let msg = config_error("[config]\nconcurrency = 0\n[[job]]\nname = \"a\"\ncmd = \"true\"\n");
    assert!(msg.contains("concurrency"), "{msg}");
}

#[test]
fn too_many_retries_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_job(JobConfigBuilder::new("a", "true").retries(11).build())
        .raw();
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("retries"), "{err}");
}

#[test]
fn bad_duration_names_the_field() {
    let msg = config_error("[[job]]\nname = \"slow\"\ncmd = \"true\"\ntimeout = \"ten seconds\"\n");
    assert!(msg.contains("job 'slow' `timeout`"), "{msg}");

    let msg = config_error("[config]\ndrain_window = \"5\"\n[[job]]\nname = \"a\"\ncmd = \"true\"\n");
    assert!(msg.contains("drain_window"), "{msg}");
}

#[test]
fn bad_quoting_in_cmd_is_a_config_error() {
    let msg = config_error("[[job]]\nname = \"q\"\ncmd = \"echo 'oops\"\n");
    assert!(msg.contains("job 'q' has an invalid `cmd`"), "{msg}");
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let cfg = ConfigFileBuilder::new()
        .with_job(JobConfigBuilder::new("only", "true").build())
        .build();

    assert_eq!(cfg.settings.concurrency, jobrun::config::default_concurrency());
    assert_eq!(cfg.settings.drain_window, Duration::from_millis(100));
    let job = cfg.job("only").unwrap();
    assert_eq!(job.timeout, None);
    assert_eq!(job.retry.attempts, 1);
}

#[test]
fn global_suppress_output_is_the_job_default() {
    let cfg = ConfigFileBuilder::new()
        .suppress_output(true)
        .with_job(JobConfigBuilder::new("inherit", "true").build())
        .with_job(JobConfigBuilder::new("loud", "true").suppress_output(false).build())
        .build();

    assert!(cfg.job("inherit").unwrap().suppress_output);
    assert!(!cfg.job("loud").unwrap().suppress_output);
}

#[cfg(unix)]
#[test]
fn relative_cwd_resolves_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Jobrun.toml");
    fs::write(
        &path,
        "[[job]]\nname = \"a\"\ncmd = \"true\"\ncwd = \"sub/dir\"\n\
         [[job]]\nname = \"b\"\ncmd = \"true\"\ncwd = \"/abs\"\n",
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.job("a").unwrap().cwd.as_deref(), Some(dir.path().join("sub/dir").as_path()));
    assert_eq!(cfg.job("b").unwrap().cwd.as_deref(), Some(std::path::Path::new("/abs")));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, JobrunError::IoError(_)), "{err:?}");
}

#[test]
fn kill_signal_spellings() {
    for (text, expected) in [
        ("term", KillSignal::Terminate),
        ("SIGTERM", KillSignal::Terminate),
        ("Int", KillSignal::Interrupt),
        ("sigkill", KillSignal::Kill),
        ("hup", KillSignal::Hangup),
        ("QUIT", KillSignal::Quit),
    ] {
        assert_eq!(text.parse::<KillSignal>().unwrap(), expected, "{text}");
    }
    assert!("usr1".parse::<KillSignal>().is_err());
    assert_eq!(KillSignal::default(), KillSignal::Terminate);
    assert!(KillSignal::Kill.is_forceful());
    assert!(!KillSignal::Terminate.is_forceful());
    assert_eq!(KillSignal::Hangup.to_string(), "SIGHUP");
}

#[test]
fn duration_strings() {
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration(" 3s ").unwrap(), Duration::from_secs(3));
    assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn oversized_durations_are_errors_not_overflows() {
    let err = parse_duration("307445734561825861m").unwrap_err();
    assert!(err.contains("too large"), "{err}");
    assert!(parse_duration("5124095576030432h").unwrap_err().contains("too large"));
    assert_eq!(
        parse_duration(&format!("{}s", u64::MAX)).unwrap(),
        Duration::from_secs(u64::MAX)
    );

    let msg = config_error("[[job]]\nname = \"big\"\ncmd = \"true\"\ntimeout = \"307445734561825861m\"\n");
    assert!(msg.contains("job 'big' `timeout`") && msg.contains("too large"), "{msg}");
}

fn sample_plan(overrides: &PlanOverrides) -> Result<Plan, JobrunError> {
    Plan::from_config(&validated(SAMPLE).unwrap(), overrides)
}

#[test]
fn plan_keeps_file_order_and_maps_options() {
    let plan = sample_plan(&PlanOverrides::default()).unwrap();

    assert_eq!(plan.concurrency.get(), 3);
    let names: Vec<_> = plan.jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["build", "test"]);

    let build = &plan.jobs[0];
    assert_eq!(build.request.exe, "dotnet");
    assert_eq!(build.request.options.timeout, Some(Duration::from_secs(600)));
    assert_eq!(build.request.options.kill_signal, KillSignal::Interrupt);
    assert_eq!(build.request.options.force_kill_after, Some(Duration::from_secs(2)));
    assert_eq!(build.request.options.drain_window, Duration::from_millis(250));
    assert!(!build.request.options.suppress_output);

    let test = &plan.jobs[1];
    assert_eq!(
        test.request.options.env,
        vec![("DOTNET_NOLOGO".to_string(), "1".to_string())]
    );
    assert_eq!(test.retry.attempts, 3);
}

#[test]
fn plan_overrides_filter_cap_and_quiet() {
    let plan = sample_plan(&PlanOverrides {
        concurrency: NonZeroUsize::new(1),
        only: vec!["test".to_string()],
        quiet: true,
    })
    .unwrap();

    assert_eq!(plan.concurrency.get(), 1);
    assert_eq!(plan.jobs.len(), 1);
    assert_eq!(plan.jobs[0].name, "test");
    assert!(plan.jobs[0].request.options.suppress_output);
}

#[test]
fn plan_rejects_unknown_job_names() {
    let err = sample_plan(&PlanOverrides {
        only: vec!["deploy".to_string()],
        ..PlanOverrides::default()
    })
    .unwrap_err();
    assert!(matches!(err, JobrunError::JobNotFound(ref name) if name == "deploy"), "{err:?}");
}
