use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const GREETING: &str = "\
Nombre: Juan | Edad: 30 | Salario: 2500.75
Mayor de edad
Contador: 0
Contador: 1
Contador: 2
";

/// Helper to get the greeting binary command
fn greeting_cmd() -> Command {
    let mut cmd = Command::cargo_bin("greeting").unwrap();
    cmd.env_remove("COMPLETE");
    cmd
}

mod greeting_output {
    use super::*;

    #[test]
    fn prints_exact_five_lines() {
        greeting_cmd()
            .assert()
            .success()
            .stdout(GREETING);
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let first = greeting_cmd().output().expect("Failed to execute");
        let second = greeting_cmd().output().expect("Failed to execute");

        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn logging_stays_off_stdout() {
        greeting_cmd()
            .env("RUST_LOG", "trace")
            .assert()
            .success()
            .stdout(GREETING)
            .stderr(predicate::str::contains("printing greeting"));
    }

    #[test]
    fn unknown_flag_fails() {
        greeting_cmd()
            .arg("--salary")
            .assert()
            .failure()
            .stdout(predicate::str::is_empty());
    }
}

mod tokens_subcommand {
    use super::*;

    #[test]
    fn demo_source_table_starts_with_class_header() {
        greeting_cmd()
            .arg("tokens")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("1:1     ACCESS_MODIFIER       public\n"))
            .stdout(predicate::str::contains("9:9     PRINT_CALL            System.out.printf"))
            .stdout(predicate::str::contains("Variables").not());
    }

    #[test]
    fn json_output_is_an_array_of_tokens() {
        let output = greeting_cmd()
            .args(["tokens", "--json"])
            .output()
            .expect("Failed to execute");
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let tokens = json.as_array().unwrap();
        assert_eq!(tokens[0]["kind"], "ACCESS_MODIFIER");
        assert_eq!(tokens[0]["lexeme"], "public");
        assert_eq!(tokens[0]["line"], 1);
        assert_eq!(tokens[0]["column"], 1);
    }

    #[test]
    fn tokenizes_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Edad.java");
        fs::write(&path, "int edad = 18;\n").unwrap();

        greeting_cmd()
            .args(["tokens", "--file"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("1:1     DATA_TYPE             int"))
            .stdout(predicate::str::contains("1:12    NUMBER                18"))
            .stdout(predicate::str::contains("1:14    DELIMITER             ;"));
    }

    #[test]
    fn invalid_character_is_listed_as_error_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Bad.java");
        fs::write(&path, "int x;\n  @Override\n").unwrap();

        greeting_cmd()
            .args(["tokens", "--file"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("{:<8}{:<22}@", "2:3", "ERROR")))
            .stdout(predicate::str::contains(format!(
                "{:<8}{:<22}Override",
                "2:4", "IDENTIFIER"
            )));
    }

    #[test]
    fn missing_file_fails() {
        greeting_cmd()
            .args(["tokens", "--file", "/nonexistent/Nope.java"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read source"));
    }
}

/// Writes `source` to a temporary `.java` file; keep the dir alive.
fn java_file(source: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Prueba.java");
    fs::write(&path, source).unwrap();
    (dir, path)
}

mod ast_subcommand {
    use super::*;

    #[test]
    fn demo_tree_has_one_class_with_main() {
        let output = greeting_cmd()
            .arg("ast")
            .output()
            .expect("Failed to execute");
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let class = &json["items"][0];
        assert_eq!(class["item"], "class");
        assert_eq!(class["name"], "EjemploPatterns");
        assert_eq!(class["members"][0]["member"], "method");
        assert_eq!(class["members"][0]["name"], "main");
        assert_eq!(class["members"][0]["body"]["statements"][3]["stmt"], "print");
    }

    #[test]
    fn invalid_character_fails_with_position() {
        let (_dir, path) = java_file("int x;\n  @Override\n");

        greeting_cmd()
            .args(["ast", "--file"])
            .arg(&path)
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Invalid character '@' at line 2, column 3"));
    }

    #[test]
    fn syntax_error_reports_expected_token() {
        let (_dir, path) = java_file("int x = 1\nint y = 2;\n");

        greeting_cmd()
            .args(["ast", "--file"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse source"))
            .stderr(predicate::str::contains(
                "Expected ';' but found 'int' at line 2, column 1",
            ));
    }
}

mod check_subcommand {
    use super::*;

    #[test]
    fn demo_source_is_clean() {
        greeting_cmd()
            .arg("check")
            .assert()
            .success()
            .stdout("No problems found\n");
    }

    #[test]
    fn reports_every_problem_and_fails() {
        let (_dir, path) = java_file(
            "int edad;\nint otra = edad + 1;\nnombre = \"Ana\";\nif (otra) { }\n",
        );

        greeting_cmd()
            .args(["check", "--file"])
            .arg(&path)
            .assert()
            .failure()
            .stdout(predicate::str::contains(
                "2:12: error[uninitialized]: variable 'edad' is used before being initialized",
            ))
            .stdout(predicate::str::contains(
                "3:1: error[undeclared]: variable 'nombre' is not declared",
            ))
            .stdout(predicate::str::contains(
                "4:5: error[non-boolean-condition]: condition of 'if' must be boolean, found 'int'",
            ))
            .stderr(predicate::str::contains("3 semantic error(s) found"));
    }

    #[test]
    fn json_lists_diagnostics() {
        let (_dir, path) = java_file("final int x = 1;\nx = 2;\n");

        let output = greeting_cmd()
            .args(["check", "--json", "--file"])
            .arg(&path)
            .output()
            .expect("Failed to execute");
        assert!(!output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let diagnostics = json.as_array().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["kind"], "assign-to-final");
        assert_eq!(diagnostics[0]["position"]["line"], 2);
        assert_eq!(diagnostics[0]["position"]["column"], 1);
    }
}

mod py_subcommand {
    use super::*;

    #[test]
    fn demo_translation_runs_main() {
        greeting_cmd()
            .arg("py")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("class EjemploPatterns:\n"))
            .stdout(predicate::str::contains("        for i in range(0, 3):\n"))
            .stdout(predicate::str::contains(
                "            print(\"Contador: \" + str(i))\n",
            ))
            .stdout(predicate::str::ends_with(
                "if __name__ == \"__main__\":\n    EjemploPatterns.main([])\n",
            ));
    }

    #[test]
    fn untranslatable_expression_fails_with_position() {
        let (_dir, path) = java_file("int i = 0;\nint j = i++;\n");

        greeting_cmd()
            .args(["py", "--file"])
            .arg(&path)
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains(
                "Cannot translate '++' inside an expression at line 2, column 9",
            ));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag_shows_usage() {
        greeting_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("tokens"))
            .stdout(predicate::str::contains("check"))
            .stdout(predicate::str::contains("py"));
    }

    #[test]
    fn version_flag_shows_binary_name() {
        greeting_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("greeting"));
    }
}
