#![cfg(feature = "e2e")]

mod common;

use common::{CommandOutput, TestContext};

#[test]
fn e2e_install_hugo_from_github() {
    let ctx = TestContext::new();

    // hugo 0.68 ships `hugo_0.68.3_Linux-64bit.tar.gz` with the binary at the top level
    let templates = ctx.store_dir.join("templates.yaml");
    std::fs::create_dir_all(&ctx.store_dir).unwrap();
    std::fs::write(
        &templates,
        "templates:\n  spf13/hugo:\n    - range: \">=0.20.0, <0.103.0\"\n      tarball: \"{name}_{version}_Linux-64bit.tar.gz\"\n      binary: \"{name}\"\n",
    )
    .unwrap();

    // Example: binrc install hugo 0.68.3
    let output: CommandOutput = ctx
        .cmd()
        .args(["-q", "install", "hugo", "0.68.3"])
        .output()
        .expect("Failed to run binrc")
        .into();

    output.assert_success();
    let path = ctx.binary_path("spf13", "hugo", "v0.68.3");
    assert_eq!(output.stdout.trim(), path.display().to_string());

    let version: CommandOutput = std::process::Command::new(&path)
        .arg("version")
        .output()
        .expect("Failed to run installed hugo")
        .into();
    version.assert_success().assert_stdout_contains("v0.68.3");
}

#[test]
fn e2e_missing_release_is_not_installed() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .args(["-q", "install", "spf13/hugo", "0.0.1"])
        .output()
        .expect("Failed to run binrc")
        .into();

    output.assert_failure().assert_stderr_contains("status 404");
    assert!(!ctx.binary_path("spf13", "hugo", "v0.0.1").exists());
    assert!(ctx.staging_dirs().is_empty());
}
