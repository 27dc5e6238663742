use std::path::{Path, PathBuf};
use std::process::Command;

const MAX_LINES: usize = 750;

const CHECKED_EXTENSIONS: &[&str] = &["rs", "yaml"];

const CHECKED_ROOTS: &[&str] = &["src", "triage.yaml"];

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let sha = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=TRIAGE_GIT_SHA={}", sha);

    let root = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let files = collect_files_to_check(&root);
    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    enforce_formatting(&root, &files);
    enforce_line_limits(&root, &files);
    enforce_no_dead_code_allows(&root, &files);
}

fn enforce_formatting(root: &Path, files: &[PathBuf]) {
    if std::env::var("SKIP_FORMAT_CHECK").is_ok() {
        return;
    }

    let rust_files: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rs"))
        .collect();
    if rust_files.is_empty() {
        return;
    }

    let rustfmt_available = Command::new("rustfmt")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !rustfmt_available {
        println!("cargo:warning=rustfmt not found, skipping format check");
        return;
    }

    let mut cmd = Command::new("rustfmt");
    cmd.arg("--check").arg("--edition").arg("2021");
    for file in &rust_files {
        cmd.arg(file);
    }

    let output = match cmd.output() {
        Ok(o) => o,
        Err(e) => {
            println!("cargo:warning=Failed to run rustfmt: {}", e);
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);

        let mut unformatted_files: Vec<String> = Vec::new();
        for line in stdout.lines().chain(stderr.lines()) {
            if let Some(path) = line.strip_prefix("Diff in ") {
                let path = path.trim_end_matches(':');
                let path = path.rsplit_once(" at line ").map_or(path, |(file, _)| file);
                let path = Path::new(path);
                let rel = path.strip_prefix(root).unwrap_or(path);
                let rel = rel.to_string_lossy().to_string();
                if !unformatted_files.contains(&rel) {
                    unformatted_files.push(rel);
                }
            }
        }

        eprintln!("\n========================================");
        eprintln!("CODE FORMATTING CHECK FAILED");
        eprintln!("========================================");
        if unformatted_files.is_empty() {
            eprintln!("Some files are not properly formatted.");
        } else {
            eprintln!("The following files are not formatted:");
            for file in &unformatted_files {
                eprintln!("  - {}", file);
            }
        }
        eprintln!("========================================");
        eprintln!("\nTo fix, run:\n");
        eprintln!("    cargo fmt");
        eprintln!("\n========================================\n");
        panic!("Build failed: code is not formatted. Run 'cargo fmt' to fix.");
    }
}

fn enforce_line_limits(root: &Path, files: &[PathBuf]) {
    let mut violations = Vec::new();
    for file in files {
        if let Ok(content) = std::fs::read_to_string(file) {
            let line_count = count_non_empty_lines(&content);
            if line_count > MAX_LINES {
                let rel_path = file.strip_prefix(root).unwrap_or(file);
                violations.push((rel_path.to_path_buf(), line_count));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n========================================");
        eprintln!("FILE LINE LIMIT EXCEEDED (max {} lines)", MAX_LINES);
        eprintln!("========================================");
        for (path, lines) in &violations {
            eprintln!(
                "  {} - {} lines (exceeds by {})",
                path.display(),
                lines,
                lines - MAX_LINES
            );
        }
        eprintln!("========================================\n");
        panic!(
            "Build failed: {} file(s) exceed the {} line limit",
            violations.len(),
            MAX_LINES
        );
    }
}

fn enforce_no_dead_code_allows(root: &Path, files: &[PathBuf]) {
    let mut violations: Vec<(PathBuf, usize)> = Vec::new();

    for file in files
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rs"))
    {
        if let Ok(content) = std::fs::read_to_string(file) {
            for (line_num, line) in content.lines().enumerate() {
                let trimmed = line.trim();
                if (trimmed.starts_with("#[allow(") || trimmed.starts_with("#![allow("))
                    && trimmed.contains("dead_code")
                {
                    let rel_path = file.strip_prefix(root).unwrap_or(file).to_path_buf();
                    violations.push((rel_path, line_num + 1));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n========================================");
        eprintln!("#[allow(dead_code)] IS NOT ALLOWED");
        eprintln!("========================================");
        for (path, line_num) in &violations {
            eprintln!("  {}:{}", path.display(), line_num);
        }
        eprintln!("\nDelete unused code, or gate test helpers behind #[cfg(test)].\n");
        panic!(
            "Build failed: {} #[allow(dead_code)] occurrence(s) found. Remove the dead code.",
            violations.len()
        );
    }
}

fn collect_files_to_check(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in CHECKED_ROOTS {
        let path = root.join(entry);
        if path.is_dir() {
            walk_directory(&path, &mut files);
        } else if should_check_file(&path) {
            files.push(path);
        }
    }
    files
}

fn walk_directory(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_directory(&path, files);
        } else if should_check_file(&path) {
            files.push(path);
        }
    }
}

fn should_check_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CHECKED_EXTENSIONS.contains(&ext))
}

fn count_non_empty_lines(content: &str) -> usize {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count()
}
