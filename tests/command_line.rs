// tests/command_line.rs

use jobrun::errors::JobrunError;
use jobrun::exec::{ExecutionRequest, parse_command_line, split_command_line};

fn split(line: &str) -> Vec<String> {
    split_command_line(line).expect("valid command line")
}

#[test]
fn whitespace_separates_arguments() {
    assert_eq!(split("dotnet test  --no-build\t-v q"), vec!["dotnet", "test", "--no-build", "-v", "q"]);
    assert_eq!(split("  leading and trailing  "), vec!["leading", "and", "trailing"]);
}

#[test]
fn quoted_segments_stay_whole_without_their_quotes() {
    assert_eq!(
        split(r#"dotnet test "My Tests.csproj" 'single quoted arg'"#),
        vec!["dotnet", "test", "My Tests.csproj", "single quoted arg"]
    );
}

#[test]
fn adjacent_quoted_and_bare_pieces_join() {
    assert_eq!(split(r#"--name="a b" x'y z'w"#), vec!["--name=a b", "xy zw"]);
}

#[test]
fn other_quote_kind_is_literal_inside_quotes() {
    assert_eq!(split(r#"echo "it's" 'say "hi"'"#), vec!["echo", "it's", r#"say "hi""#]);
}

#[test]
fn empty_quotes_make_an_empty_argument() {
    assert_eq!(split(r#"prog "" ''"#), vec!["prog", "", ""]);
}

#[test]
fn empty_line_has_no_arguments() {
    assert!(split("").is_empty());
    assert!(split("   ").is_empty());
}

#[test]
fn unterminated_quote_is_rejected() {
    for line in [r#"echo "oops"#, "echo 'oops", r#"a "b" "c"#] {
        let err = split_command_line(line).expect_err(line);
        assert!(matches!(err, JobrunError::CommandLine(_)), "{line}: {err:?}");
        assert!(err.to_string().contains("unterminated quote"), "{err}");
    }
}

#[test]
fn parse_splits_off_the_executable() {
    let (exe, args) = parse_command_line(r#""C:\Program Files\dotnet\dotnet.exe" build"#).unwrap();
    assert_eq!(exe, r"C:\Program Files\dotnet\dotnet.exe");
    assert_eq!(args, vec!["build"]);
}

#[test]
fn parse_rejects_empty_command_and_empty_executable() {
    assert!(matches!(parse_command_line("   "), Err(JobrunError::CommandLine(_))));
    assert!(matches!(parse_command_line(r#""" arg"#), Err(JobrunError::CommandLine(_))));
}

#[test]
fn request_from_command_line_keeps_argument_vector() {
    let request = ExecutionRequest::from_command_line(r#"echo "hello world""#).unwrap();
    assert_eq!(request.exe, "echo");
    assert_eq!(request.args, vec!["hello world"]);
    assert!(request.display().contains("echo"));
}
