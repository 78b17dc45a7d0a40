use crate::bulk;
use crate::cli::parser::{Cli, Command, RepoArgs};
use crate::config::{self, ConfigKey, Settings};
use crate::extract;
use crate::github::client::GitHubClient;
use crate::output;
use crate::scan::{self, ScanOutcome};
use crate::storage::{JsonFileStore, RecordStore};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SCAN_OUTPUT: &str = "data.json";
const DEFAULT_FETCH_OUTPUT: &str = "issue_data.json";

/// Options shared by every command.
struct Globals {
    config: Option<PathBuf>,
    api_url: Option<String>,
    token: Option<String>,
}

impl Globals {
    /// Layers flag/environment values over the config file and resolves them.
    fn settings(
        &self,
        repo: &RepoArgs,
        extra: &[(ConfigKey, Option<&str>)],
        default_output: &str,
    ) -> anyhow::Result<Settings> {
        let path = self.config.clone().unwrap_or_else(config::default_config_path);
        let file_config = config::load_config(&path)?;

        let mut values = vec![
            (ConfigKey::Owner, repo.owner.as_deref()),
            (ConfigKey::Repo, repo.repo.as_deref()),
            (ConfigKey::ApiUrl, self.api_url.as_deref()),
        ];
        values.extend_from_slice(extra);
        let merged = config::update_config(&file_config, &config::overrides(values));

        Settings::resolve(&merged, self.token.as_deref(), default_output)
    }
}

fn client_for(settings: &Settings) -> anyhow::Result<GitHubClient> {
    GitHubClient::new(&settings.api_url, &settings.token, settings.timeout)
        .context("Failed to create HTTP client")
}

pub async fn run(cli: Cli, mut stdout_additional: Option<&mut dyn std::io::Write>) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        api_url,
        token,
        ..
    } = cli;
    let globals = Globals {
        config,
        api_url,
        token,
    };

    match command {
        Command::Scan(args) => {
            let settings = globals.settings(
                &args.repo,
                &[
                    (ConfigKey::Label, args.label.as_deref()),
                    (ConfigKey::Output, args.output.as_deref()),
                ],
                DEFAULT_SCAN_OUTPUT,
            )?;
            let client = client_for(&settings)?;
            let store = JsonFileStore::new(&settings.output);

            let outcome = scan::scan(&client, &settings.repo, &settings.label, &store)
                .await
                .context("Scan aborted")?;

            if let ScanOutcome::RateLimited { reset, .. } = &outcome {
                tracing::warn!(
                    reset = ?reset,
                    "Results are partial because the rate limit was reached"
                );
            }
            tracing::info!(path = %store.path().display(), "results saved");

            output::println(
                &format!(
                    "Fetched {} closed issues from {}",
                    outcome.issues().len(),
                    settings.repo
                ),
                &mut stdout_additional,
            )?;
            for issue in outcome.issues() {
                output::println(
                    &format!("- #{}: {}", issue.number, issue.title),
                    &mut stdout_additional,
                )?;
            }
        }
        Command::Fetch(args) => {
            let settings = globals.settings(
                &args.repo,
                &[(ConfigKey::Output, args.output.as_deref())],
                DEFAULT_FETCH_OUTPUT,
            )?;
            let ids = extract::extract_from_file(&args.input)?;
            let client = client_for(&settings)?;

            let records = bulk::fetch_all(
                &client,
                &settings.repo,
                &ids,
                Duration::from_millis(args.delay_ms),
            )
            .await;

            let store = JsonFileStore::new(&settings.output);
            store.save(records.as_slice()).context("Failed to save issue records")?;

            output::println(
                &format!(
                    "Done! {} of {} issues saved to {}",
                    records.len(),
                    ids.len(),
                    store.path().display()
                ),
                &mut stdout_additional,
            )?;
        }
        Command::Extract(args) => {
            for id in extract::extract_from_file(&args.input)? {
                output::println(&id.to_string(), &mut stdout_additional)?;
            }
        }
    }
    Ok(())
}
