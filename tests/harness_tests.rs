use helm_debugger::chart::{parse_chart, template_files, validate_chart_directory};
use helm_debugger::config::DebugConfig;
use helm_debugger::error::DebugError;
use helm_debugger::executor::{HelmCommand, RenderOutcome, TempChart};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_chart() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path();
    fs::write(root.join("Chart.yaml"), "apiVersion: v2\nname: mychart\n").unwrap();
    fs::create_dir_all(root.join("templates/jobs")).unwrap();
    fs::write(root.join("templates/service.yaml"), "kind: Service\n").unwrap();
    fs::write(root.join("templates/_helpers.tpl"), "{{- define \"x\" }}x{{ end }}\n").unwrap();
    fs::write(root.join("templates/jobs/migrate.yml"), "kind: Job\n").unwrap();
    fs::write(root.join("templates/empty.yaml"), "\n\n").unwrap();
    fs::write(root.join("templates/NOTES.txt"), "thanks\n").unwrap();
    dir
}

#[cfg(test)]
mod chart_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discovery_is_sorted_and_filtered() {
        let chart = create_chart();
        let files = template_files(chart.path()).unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("templates/_helpers.tpl"),
                PathBuf::from("templates/empty.yaml"),
                PathBuf::from("templates/jobs/migrate.yml"),
                PathBuf::from("templates/service.yaml"),
            ]
        );
    }

    #[test]
    fn test_parsed_chart_skips_empty_files() {
        let chart = create_chart();
        let parsed = parse_chart(chart.path()).unwrap();

        let names: Vec<String> = parsed.templates.iter().map(|t| t.template_name()).collect();
        assert_eq!(names, vec!["_helpers.tpl", "jobs/migrate.yml", "service.yaml"]);
        assert!(parsed.templates[0].is_helper());
        assert_eq!(parsed.non_helpers().count(), 2);
        assert_eq!(parsed.total_blocks(), 3);
    }

    #[test]
    fn test_find_by_citation() {
        let chart = create_chart();
        let parsed = parse_chart(chart.path()).unwrap();

        assert!(parsed.find("migrate.yml").is_some());
        assert!(parsed.find("jobs/migrate.yml").is_some());
        assert!(parsed.find("templates/service.yaml").is_some());
        assert!(parsed.find("ingress.yaml").is_none());
    }

    #[test]
    fn test_ambiguous_file_name_needs_full_path() {
        let chart = create_chart();
        fs::write(chart.path().join("templates/jobs/service.yaml"), "kind: Job\n").unwrap();
        let parsed = parse_chart(chart.path()).unwrap();

        assert_eq!(
            parsed.find("service.yaml").map(|t| t.template_name()),
            Some("service.yaml".to_string())
        );
        assert_eq!(
            parsed.find("jobs/service.yaml").map(|t| t.template_name()),
            Some("jobs/service.yaml".to_string())
        );

        fs::remove_file(chart.path().join("templates/service.yaml")).unwrap();
        fs::create_dir_all(chart.path().join("templates/web")).unwrap();
        fs::write(chart.path().join("templates/web/service.yaml"), "kind: Service\n").unwrap();
        let parsed = parse_chart(chart.path()).unwrap();
        assert!(parsed.find("service.yaml").is_none());
    }

    #[test]
    fn test_validation_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            validate_chart_directory(&dir.path().join("missing")),
            Err(DebugError::ChartNotFound(_))
        ));
        assert!(matches!(
            validate_chart_directory(dir.path()),
            Err(DebugError::InvalidChart(_))
        ));

        fs::write(dir.path().join("Chart.yaml"), "name: x\n").unwrap();
        let err = validate_chart_directory(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No templates directory"));
    }
}

#[cfg(test)]
mod harness_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_temp_chart_overrides_one_template() {
        let chart = create_chart();
        let root_path;
        {
            let temp = TempChart::create(chart.path()).unwrap();
            root_path = temp.root().to_path_buf();
            temp.write_template(Path::new("templates/service.yaml"), "kind: Broken\n")
                .unwrap();

            assert_eq!(
                fs::read_to_string(temp.root().join("templates/service.yaml")).unwrap(),
                "kind: Broken\n"
            );
            assert!(temp.root().join("templates/jobs/migrate.yml").is_file());
            assert!(temp.root().join("Chart.yaml").is_file());
        }

        assert!(!root_path.exists());
        assert_eq!(
            fs::read_to_string(chart.path().join("templates/service.yaml")).unwrap(),
            "kind: Service\n"
        );
    }

    #[test]
    fn test_helm_arguments() {
        let config = DebugConfig {
            release_name: "rel".to_string(),
            values_files: vec![PathBuf::from("/tmp/values.yaml")],
            set_values: vec!["image.tag=v1".to_string()],
            extra_args: DebugConfig::parse_extra_args("--kube-version '1.29'").unwrap(),
            ..DebugConfig::default()
        };
        let helm = HelmCommand::new(PathBuf::from("helm"), &config);

        let expected: Vec<OsString> = [
            "template",
            "rel",
            "/charts/demo",
            "-f",
            "/tmp/values.yaml",
            "--set",
            "image.tag=v1",
            "--kube-version",
            "1.29",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        assert_eq!(helm.args(Path::new("/charts/demo")), expected);
    }

    #[test]
    fn test_error_message_keeps_error_lines() {
        let outcome = RenderOutcome::from_exit(
            1,
            String::new(),
            "walk.go:74: debug info\nError: template: x/templates/a.yaml:1:2: boom\n".to_string(),
            5,
        );
        assert!(!outcome.passed);
        assert_eq!(outcome.error_message(), "Error: template: x/templates/a.yaml:1:2: boom");

        let plain = RenderOutcome::from_exit(1, String::new(), "killed\n".to_string(), 5);
        assert_eq!(plain.error_message(), "killed");
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use helm_debugger::error::DebugError;
    use helm_debugger::executor::run_with_timeout;
    use std::process::Command;
    use std::time::Duration;

    #[test]
    fn test_captures_streams_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo rendered; echo 'Error: bad' >&2; exit 3"]);
        let outcome = run_with_timeout(cmd, Duration::from_secs(10)).unwrap();

        assert_eq!(outcome.exit_code, 3);
        assert!(!outcome.passed);
        assert_eq!(outcome.stdout, "rendered\n");
        assert_eq!(outcome.error_message(), "Error: bad");
    }

    #[test]
    fn test_slow_render_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run_with_timeout(cmd, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, DebugError::RenderTimeout { .. }));
    }

    #[test]
    fn test_missing_program_is_helm_not_found() {
        let cmd = Command::new("/nonexistent/helm-binary");
        let err = run_with_timeout(cmd, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DebugError::HelmNotFound));
    }
}
