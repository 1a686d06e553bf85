//! End to end tests of the `--count` mode, which never touches the terminal.
#[cfg(test)]
mod count_cli {
    use std::io::Write as _;

    fn downpour() -> std::process::Command {
        std::process::Command::new(env!("CARGO_BIN_EXE_downpour"))
    }

    #[test]
    fn prints_counts_and_exits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "The rain in Spain\nfalls mainly\ton the plain").unwrap();

        let output = downpour()
            .arg("--count")
            .arg(file.path())
            .output()
            .unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(!stdout.contains('\x1b'), "{stdout:?}");
        assert!(
            stdout.contains(indoc::indoc! {"
                Characters: 43
                Characters (no spaces): 35
                Words: 9
            "}),
            "{stdout}"
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        let output = downpour()
            .arg("--count")
            .arg(directory.path().join("nope.txt"))
            .output()
            .unwrap();

        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("nope.txt"), "{stderr}");
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(!stdout.contains("\x1b[2J"), "{stdout:?}");
    }
}
