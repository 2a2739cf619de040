//! Unit tests for the architecture lint.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest::rstest;

use super::*;

#[derive(Clone, Copy)]
struct LintSingle;

impl LintSingle {
    fn lint(self, file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
        lint_sources(&[LintSource {
            file: Utf8PathBuf::from(file),
            contents: contents.to_owned(),
        }])
    }
}

#[fixture]
fn lint_single() -> LintSingle {
    LintSingle
}

#[rstest]
#[case(
    "inbound/cli/app.rs",
    "use crate::domain::ports::RegistryApi; fn run(_api: &dyn RegistryApi) {}",
    true
)]
#[case(
    "inbound/cli/app.rs",
    "use crate::outbound::registry::ReqwestRegistryApi; fn run() { let _ = ReqwestRegistryApi::new; }",
    false
)]
#[case(
    "inbound/cli/app.rs",
    "use outbound::storage::FileKeyValueStore; fn run() {}",
    false
)]
#[case(
    "inbound/cli/app.rs",
    "use lifetag_client::outbound::nominatim; fn run() {}",
    false
)]
#[case("inbound/cli/app.rs", "fn run() { let _ = reqwest::Client::new(); }", false)]
#[case("inbound/cli/app.rs", "use cap_std::fs::Dir; fn run(_dir: Dir) {}", true)]
#[case(
    "domain/session.rs",
    "use crate::inbound::cli::App; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "domain/forms/controller.rs",
    "use super::super::outbound::registry; fn thing() {}",
    false
)]
#[case(
    "domain/routing/guard.rs",
    "use crate::config::ClientSettings; fn thing() {}",
    false
)]
#[case("domain/pages.rs", "use clap::Parser; #[derive(Parser)] struct Args;", false)]
#[case(
    "domain/ports/registry_api.rs",
    "use async_trait::async_trait; use serde_json::Value; #[async_trait] pub trait Api { async fn call(&self) -> Value; }",
    true
)]
#[case(
    "outbound/registry/http_api.rs",
    "use crate::inbound::cli::Cli; fn thing() { let _ = 1; }",
    false
)]
#[case(
    "outbound/nominatim/http_geocoder.rs",
    "use reqwest::Client; use crate::domain::ports::ReverseGeocoder; fn thing(_c: Client) {}",
    true
)]
#[case(
    "config.rs",
    "use ortho_config::OrthoConfig; use url::Url; fn thing(_u: Url) {}",
    true
)]
#[case("config.rs", "use crate::outbound::storage; fn thing() {}", false)]
fn detects_boundary_violations(
    lint_single: LintSingle,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
#[case("domain/mod.rs", Some(ModuleLayer::Domain))]
#[case("inbound/cli/args.rs", Some(ModuleLayer::Inbound))]
#[case("outbound/storage/file_store.rs", Some(ModuleLayer::Outbound))]
#[case("config.rs", Some(ModuleLayer::Config))]
#[case("main.rs", None)]
#[case("configuration/extra.rs", None)]
fn layers_follow_the_top_level_module(#[case] file: &str, #[case] expected: Option<ModuleLayer>) {
    assert_eq!(
        ModuleLayer::infer_from_path(Utf8Path::new(file)),
        expected
    );
}

#[rstest]
fn unplaced_files_are_reported_as_parse_errors(lint_single: LintSingle) {
    let err = lint_single
        .lint("main.rs", "fn main() {}")
        .expect_err("no layer for main.rs");
    assert!(matches!(err, ArchitectureLintError::Parse { .. }), "{err:?}");
}

#[rstest]
fn repeated_violations_in_one_file_are_reported_once(lint_single: LintSingle) {
    let err = lint_single
        .lint(
            "domain/pages.rs",
            "use reqwest::Client; fn a(_c: reqwest::Client) {} fn b() { let _ = reqwest::get; }",
        )
        .expect_err("reqwest in domain");
    let ArchitectureLintError::Violations(violations) = err else {
        panic!("expected violations, got {err:?}");
    };
    assert_eq!(violations.len(), 1, "{violations:?}");
    assert_eq!(
        violations[0].to_string(),
        "domain/pages.rs: domain module must not depend on external crate `reqwest`"
    );
}
