#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;

    fn uploader() -> Command {
        let mut cmd = Command::cargo_bin("atom_artifact_uploader").expect("binary builds");
        cmd.env_remove("ATOM_RELEASE_VERSION");
        cmd
    }

    #[test]
    fn no_assets_exits_one_before_any_upload() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "atom", "version": "1.60.0" }"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();

        uploader()
            .current_dir(dir.path())
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("No assets found"));
    }

    #[test]
    fn explicit_assets_path_is_named_in_the_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.60.0" }"#,
        )
        .unwrap();
        let empty = dir.path().join("artifacts");
        fs::create_dir(&empty).unwrap();

        uploader()
            .current_dir(dir.path())
            .arg("--assets-path")
            .arg(&empty)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("No assets found under specified path"))
            .stderr(predicate::str::contains("artifacts"));
    }

    #[test]
    fn fatal_errors_are_reported_on_stderr() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "not a version" }"#,
        )
        .unwrap();

        uploader()
            .current_dir(dir.path())
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains(
                "An error occurred while uploading the release",
            ));
    }

    #[test]
    fn empty_flag_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "version": "1.60.0" }"#,
        )
        .unwrap();

        uploader()
            .current_dir(dir.path())
            .args(["--linux-repo-name", ""])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("--linux-repo-name must not be empty"));
    }

    #[test]
    fn help_documents_every_flag() {
        uploader()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--assets-path"))
            .stdout(predicate::str::contains("--s3-path"))
            .stdout(predicate::str::contains("--create-github-release"))
            .stdout(predicate::str::contains("--linux-repo-name"));
    }
}
