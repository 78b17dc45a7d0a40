use cucumber::World;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use wiremock::MockServer;

#[derive(Default, World)]
pub struct BugscanWorld {
    pub token: Option<String>,
    pub listing_pages: BTreeMap<u32, Vec<Value>>,
    pub rate_limited_page: Option<u32>,
    pub failing_page: Option<u32>,
    pub issues: BTreeMap<u64, Value>,
    pub timelines: HashMap<u64, Vec<Value>>,
    pub rate_limited_timelines: BTreeSet<u64>,
    pub workdir: Option<tempfile::TempDir>,
    pub server: Option<MockServer>,
    pub captured_output: Vec<u8>,
    pub captured_error: Vec<u8>,
    pub command_status: Option<ExitStatus>,
}

impl BugscanWorld {
    pub fn workdir(&mut self) -> PathBuf {
        self.workdir
            .get_or_insert_with(|| tempfile::tempdir().expect("Failed to create work directory"))
            .path()
            .to_path_buf()
    }
}

impl fmt::Debug for BugscanWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BugscanWorld")
            .field("listing_pages", &self.listing_pages.keys().collect::<Vec<_>>())
            .field("rate_limited_page", &self.rate_limited_page)
            .field("failing_page", &self.failing_page)
            .field("issues", &self.issues.keys().collect::<Vec<_>>())
            .field("rate_limited_timelines", &self.rate_limited_timelines)
            .field("command_status", &self.command_status)
            .finish()
    }
}

#[tokio::main]
async fn main() {
    BugscanWorld::run("features").await;
}

mod steps;
