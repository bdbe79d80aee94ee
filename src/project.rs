//! Tech-stack sniffing for the managed root
//!
//! Best-effort marker-file detection, folded into the `init_ipa_cycle`
//! response so the agent sees what it is guarding. Never fails the cycle.

use serde_json::Value;
use std::path::Path;

/// Whether the root is a git repository
pub fn is_git_repo(dir: &Path) -> bool {
    dir.join(".git").is_dir()
}

/// Detect the tech stack from marker files in `dir`
pub fn detect_tech_stack(dir: &Path) -> Vec<String> {
    let mut stack = Vec::new();

    let package_json = dir.join("package.json");
    if package_json.exists() {
        match read_package_json(&package_json) {
            Some(pkg) => {
                if has_dependency(&pkg, "next") {
                    stack.push("Next.js".to_string());
                } else if has_dependency(&pkg, "react") {
                    stack.push("React".to_string());
                } else if has_dependency(&pkg, "vue") {
                    stack.push("Vue".to_string());
                } else {
                    stack.push("Node.js".to_string());
                }
                if has_dependency(&pkg, "typescript") || has_dev_dependency(&pkg, "typescript") {
                    stack.push("TypeScript".to_string());
                }
            }
            None => stack.push("Node.js".to_string()),
        }
    }

    if dir.join("requirements.txt").exists() || dir.join("pyproject.toml").exists() {
        stack.push("Python".to_string());
    }
    if dir.join("Cargo.toml").exists() {
        stack.push("Rust".to_string());
    }
    if dir.join("go.mod").exists() {
        stack.push("Go".to_string());
    }

    stack
}

/// One-line project description for tool responses
pub fn describe(dir: &Path) -> String {
    let mut parts = detect_tech_stack(dir);
    if is_git_repo(dir) {
        parts.push("Git repo".to_string());
    }
    if parts.is_empty() {
        "unknown stack".to_string()
    } else {
        parts.join(", ")
    }
}

fn read_package_json(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn has_dependency(pkg: &Value, name: &str) -> bool {
    pkg.get("dependencies")
        .and_then(|d| d.get(name))
        .is_some()
}

fn has_dev_dependency(pkg: &Value, name: &str) -> bool {
    pkg.get("devDependencies")
        .and_then(|d| d.get(name))
        .is_some()
}
