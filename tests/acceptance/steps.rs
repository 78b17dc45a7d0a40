use crate::BugscanWorld;
use cucumber::{given, then, when};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OWNER: &str = "acme";
const REPO: &str = "widgets";

/// Environment variables the binary reads; cleared so the host cannot leak in.
const CLEARED_ENV: &[&str] = &[
    "GITHUB_TOKEN",
    "GITHUB_OWNER",
    "GITHUB_REPO",
    "GITHUB_API_URL",
    "INPUT_FILE",
    "OUTPUT_FILE",
    "RUST_LOG",
];

fn issue_json(number: u64, pull_request: bool) -> Value {
    let mut issue = json!({
        "number": number,
        "title": format!("Issue {number}"),
        "state": "closed",
        "created_at": "2024-01-01T00:00:00Z",
        "closed_at": "2024-02-01T00:00:00Z",
        "body": "Steps to reproduce",
        "user": {"login": "octocat"},
        "labels": []
    });
    if pull_request {
        issue["pull_request"] =
            json!({"url": format!("https://api.github.com/repos/{OWNER}/{REPO}/pulls/{number}")});
    }
    issue
}

fn label_event(kind: &str, label: &str, created_at: &str) -> Value {
    json!({"event": kind, "label": {"name": label}, "created_at": created_at})
}

fn timeline_for(history: &str) -> Vec<Value> {
    match history {
        "removed" => vec![
            label_event("labeled", "type:bug", "2024-01-02T00:00:00Z"),
            json!({"event": "commented", "created_at": "2024-01-03T00:00:00Z"}),
            label_event("unlabeled", "type:bug", "2024-01-04T00:00:00Z"),
        ],
        "applied" => vec![label_event("labeled", "type:bug", "2024-01-02T00:00:00Z")],
        "never used" => vec![label_event("labeled", "enhancement", "2024-01-02T00:00:00Z")],
        other => panic!("Unknown label history '{}'", other),
    }
}

fn parse_numbers(list: &str) -> Vec<u64> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().expect("Issue numbers must be integers"))
        .collect()
}

#[given(regex = r#"^the GitHub token "(.*)"$"#)]
async fn given_github_token(world: &mut BugscanWorld, token: String) {
    world.token = Some(token);
}

#[given("no GitHub token")]
async fn given_no_github_token(world: &mut BugscanWorld) {
    world.token = None;
}

#[given(regex = r"^closed (issue|pull request) #(\d+) on page (\d+) whose bug label was (removed|applied|never used)$")]
async fn given_closed_issue_on_page(
    world: &mut BugscanWorld,
    kind: String,
    number: u64,
    page: u32,
    history: String,
) {
    world
        .listing_pages
        .entry(page)
        .or_default()
        .push(issue_json(number, kind == "pull request"));
    world.timelines.insert(number, timeline_for(&history));
}

#[given(regex = r"^issue #(\d+) exists whose bug label was (removed|applied|never used)$")]
async fn given_issue_exists(world: &mut BugscanWorld, number: u64, history: String) {
    world.issues.insert(number, issue_json(number, false));
    world.timelines.insert(number, timeline_for(&history));
}

#[given(regex = r"^the issue listing is rate limited on page (\d+)$")]
async fn given_listing_rate_limited(world: &mut BugscanWorld, page: u32) {
    world.rate_limited_page = Some(page);
}

#[given(regex = r"^the issue listing fails on page (\d+)$")]
async fn given_listing_fails(world: &mut BugscanWorld, page: u32) {
    world.failing_page = Some(page);
}

#[given(regex = r"^the timeline of issue #(\d+) is rate limited$")]
async fn given_timeline_rate_limited(world: &mut BugscanWorld, number: u64) {
    world.rate_limited_timelines.insert(number);
}

#[given(regex = r#"^a scan log mentioning issues "(.*)"$"#)]
async fn given_scan_log(world: &mut BugscanWorld, list: String) {
    let log: String = parse_numbers(&list)
        .into_iter()
        .map(|n| format!("2024-05-01T10:00:00Z  INFO Found issue #{n} with label 'type:bug' applied and later removed\n"))
        .collect();
    let log_path = world.workdir().join("scan.log");
    std::fs::write(&log_path, log)
        .unwrap_or_else(|e| panic!("Failed to write scan log {:?}: {}", log_path, e));
}

fn rate_limit_response() -> ResponseTemplate {
    ResponseTemplate::new(403)
        .insert_header("x-ratelimit-remaining", "0")
        .insert_header("x-ratelimit-reset", "1700000000")
        .set_body_json(json!({"message": "API rate limit exceeded"}))
}

async fn start_github(world: &BugscanWorld) -> MockServer {
    let server = MockServer::start().await;
    let issues_path = format!("/repos/{OWNER}/{REPO}/issues");

    if let Some(page) = world.rate_limited_page {
        Mock::given(method("GET"))
            .and(path(issues_path.as_str()))
            .and(query_param("page", page.to_string()))
            .respond_with(rate_limit_response())
            .with_priority(1)
            .mount(&server)
            .await;
    }
    if let Some(page) = world.failing_page {
        Mock::given(method("GET"))
            .and(path(issues_path.as_str()))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(500).set_body_string("Server Error"))
            .with_priority(1)
            .mount(&server)
            .await;
    }
    for (page, items) in &world.listing_pages {
        Mock::given(method("GET"))
            .and(path(issues_path.as_str()))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(issues_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(10)
        .mount(&server)
        .await;

    for (number, issue) in &world.issues {
        Mock::given(method("GET"))
            .and(path(format!("{issues_path}/{number}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue))
            .mount(&server)
            .await;
    }

    for number in &world.rate_limited_timelines {
        Mock::given(method("GET"))
            .and(path(format!("{issues_path}/{number}/timeline")))
            .respond_with(rate_limit_response())
            .with_priority(1)
            .mount(&server)
            .await;
    }
    for (number, events) in &world.timelines {
        Mock::given(method("GET"))
            .and(path(format!("{issues_path}/{number}/timeline")))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/acme/widgets/issues/\d+/timeline$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(10)
        .mount(&server)
        .await;

    server
}

#[when(regex = r"^I run `bugscan (scan|fetch|extract)`$")]
async fn when_run_bugscan(world: &mut BugscanWorld, command: String) {
    let workdir = world.workdir();
    let server = start_github(world).await;

    let mut args: Vec<String> = vec!["--api-url".to_string(), server.uri(), command.clone()];
    match command.as_str() {
        "scan" => args.extend(
            ["--owner", OWNER, "--repo", REPO, "--output"]
                .iter()
                .map(|s| s.to_string())
                .chain([workdir.join("data.json").display().to_string()]),
        ),
        "fetch" => args.extend(
            ["--owner", OWNER, "--repo", REPO, "--delay-ms", "0", "--input"]
                .iter()
                .map(|s| s.to_string())
                .chain([
                    workdir.join("scan.log").display().to_string(),
                    "--output".to_string(),
                    workdir.join("issue_data.json").display().to_string(),
                ]),
        ),
        _ => args.extend([
            "--input".to_string(),
            workdir.join("scan.log").display().to_string(),
        ]),
    }

    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_bugscan"));
    cmd.args(&args).current_dir(&workdir);
    for name in CLEARED_ENV {
        cmd.env_remove(name);
    }
    if let Some(token) = &world.token {
        cmd.env("GITHUB_TOKEN", token);
    }

    let output = cmd
        .output()
        .await
        .unwrap_or_else(|e| panic!("Failed to execute bugscan {}: {}", command, e));

    world.captured_output = output.stdout;
    world.captured_error = output.stderr;
    world.command_status = Some(output.status);
    world.server = Some(server);
}

#[then("the command should succeed")]
async fn then_command_should_succeed(world: &mut BugscanWorld) {
    assert!(
        world.command_status.is_some_and(|s| s.success()),
        "Command failed with status: {:?}\n---\n{}\n---",
        world.command_status,
        String::from_utf8_lossy(&world.captured_error)
    );
}

#[then("the command should fail")]
async fn then_command_should_fail(world: &mut BugscanWorld) {
    assert!(
        world.command_status.is_none_or(|s| !s.success()),
        "Command should have failed but succeeded with status: {:?}",
        world.command_status
    );
}

#[then(regex = r#"^the output file "(.*)" should contain issues "(.*)"$"#)]
async fn then_output_file_should_contain(world: &mut BugscanWorld, file: String, list: String) {
    let output_path = world.workdir().join(&file);
    let content = std::fs::read_to_string(&output_path)
        .unwrap_or_else(|e| panic!("Failed to read output file {:?}: {}", output_path, e));
    let records: Vec<Value> = serde_json::from_str(&content).expect("Output must be a JSON array");

    let numbers: Vec<u64> = records
        .iter()
        .map(|record| {
            record
                .get("number")
                .or_else(|| record.get("issue_number"))
                .and_then(Value::as_u64)
                .expect("Record without an issue number")
        })
        .collect();

    assert_eq!(
        numbers,
        parse_numbers(&list),
        "Unexpected issues in {}:\n---\n{}\n---",
        file,
        content
    );
}

#[then(regex = r#"^the output file "(.*)" should not exist$"#)]
async fn then_output_file_should_not_exist(world: &mut BugscanWorld, file: String) {
    let output_path = world.workdir().join(&file);
    assert!(!output_path.exists(), "Output file {:?} should not exist", output_path);
}

#[then(regex = r#"^the output should contain "(.*)"$"#)]
async fn then_output_should_contain(world: &mut BugscanWorld, expected: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert!(
        output.contains(&expected),
        "Expected output to contain '{}', but got:\n---\n{}\n---",
        expected,
        output
    );
}

#[then(regex = r#"^the output lines should be "(.*)"$"#)]
async fn then_output_lines_should_be(world: &mut BugscanWorld, list: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    let lines: Vec<&str> = output.lines().collect();
    let expected: Vec<&str> = list.split(',').collect();
    assert_eq!(lines, expected, "Unexpected output:\n---\n{}\n---", output);
}

#[then(regex = r#"^the error output should contain "(.*)"$"#)]
async fn then_error_output_should_contain(world: &mut BugscanWorld, expected: String) {
    let output = String::from_utf8(world.captured_error.clone()).expect("Invalid UTF-8");
    assert!(
        output.contains(&expected),
        "Expected error output to contain '{}', but got:\n---\n{}\n---",
        expected,
        output
    );
}

#[then("no request should have reached GitHub")]
async fn then_no_request_reached_github(world: &mut BugscanWorld) {
    let server = world.server.as_ref().expect("The command was not run");
    let requests = server
        .received_requests()
        .await
        .expect("Request recording is enabled");
    assert!(
        requests.is_empty(),
        "Expected no requests, got {}",
        requests.len()
    );
}
