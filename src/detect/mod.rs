//! Framework detection for project roots.
//!
//! Two independent classifiers over a project directory:
//! `detect_test_framework` decides which test runner a project uses, and
//! `detect_project_framework` classifies the backend/frontend framework.
//! `is_test_file` classifies an individual path and is pure: it inspects
//! only the path string, never the filesystem.

use std::path::Path;

use serde_json::Value;

/// One known test framework: its precedence position is its slot in
/// [`TEST_FRAMEWORKS`]. First match wins at every detection step.
struct TestFrameworkRule {
    name: &'static str,
    /// Package names that pull the framework in (regular or dev deps).
    packages: &'static [&'static str],
    /// Config files whose presence at the project root implies the
    /// framework.
    config_files: &'static [&'static str],
}

const TEST_FRAMEWORKS: [TestFrameworkRule; 7] = [
    TestFrameworkRule {
        name: "jest",
        packages: &["jest", "ts-jest", "babel-jest"],
        config_files: &[
            "jest.config.js",
            "jest.config.ts",
            "jest.config.mjs",
            "jest.config.cjs",
            "jest.config.json",
        ],
    },
    TestFrameworkRule {
        name: "vitest",
        packages: &["vitest"],
        config_files: &["vitest.config.js", "vitest.config.ts", "vitest.config.mts"],
    },
    TestFrameworkRule {
        name: "mocha",
        packages: &["mocha"],
        config_files: &[".mocharc.json", ".mocharc.js", ".mocharc.yml", ".mocharc.cjs"],
    },
    TestFrameworkRule {
        name: "playwright",
        packages: &["@playwright/test", "playwright"],
        config_files: &["playwright.config.js", "playwright.config.ts"],
    },
    TestFrameworkRule {
        name: "cypress",
        packages: &["cypress"],
        config_files: &["cypress.config.js", "cypress.config.ts", "cypress.json"],
    },
    TestFrameworkRule {
        name: "pytest",
        packages: &["pytest"],
        config_files: &["pytest.ini", "conftest.py"],
    },
    TestFrameworkRule {
        name: "unittest",
        packages: &["unittest"],
        config_files: &[],
    },
];

/// Ordered project-framework catalogue. Meta-frameworks come before the base
/// framework they wrap (next before react, nuxt before vue, sveltekit before
/// svelte, nest before express).
const PROJECT_FRAMEWORKS: [(&str, &str); 14] = [
    ("next", "next"),
    ("nuxt", "nuxt"),
    ("@sveltejs/kit", "sveltekit"),
    ("@remix-run/react", "remix"),
    ("gatsby", "gatsby"),
    ("@angular/core", "angular"),
    ("@nestjs/core", "nestjs"),
    ("express", "express"),
    ("fastify", "fastify"),
    ("react", "react"),
    ("vue", "vue"),
    ("svelte", "svelte"),
    ("vite", "vite"),
    ("webpack", "webpack"),
];

/// Single-file ecosystem markers for manifest-less projects.
const ECOSYSTEM_MARKERS: [(&str, &str); 5] = [
    ("Cargo.toml", "rust"),
    ("go.mod", "go"),
    ("pyproject.toml", "python"),
    ("requirements.txt", "python"),
    ("Gemfile", "ruby"),
];

/// Directory or file basenames conventionally holding tests; the fallback
/// when no framework is known.
const TEST_DIR_NAMES: [&str; 5] = ["__tests__", "tests", "test", "spec", "specs"];

/// JS/TS compound suffixes accepted for jest/vitest files.
const JS_TEST_SUFFIXES: [&str; 12] = [
    ".test.js", ".test.jsx", ".test.ts", ".test.tsx", ".test.mjs", ".test.cjs",
    ".spec.js", ".spec.jsx", ".spec.ts", ".spec.tsx", ".spec.mjs", ".spec.cjs",
];

/// Read and parse the project manifest (`package.json`). A parse failure is
/// treated the same as no manifest; detection falls through to filesystem
/// rules rather than failing the operation.
fn read_manifest(root: &Path) -> Option<Value> {
    let raw = std::fs::read_to_string(root.join("package.json")).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Merged regular + dev dependency names from a manifest.
fn dependency_names(manifest: &Value) -> Vec<String> {
    let mut names = Vec::new();
    for key in ["dependencies", "devDependencies"] {
        if let Some(deps) = manifest.get(key).and_then(Value::as_object) {
            names.extend(deps.keys().cloned());
        }
    }
    names
}

/// Detect a project's test framework. Returning `None` is a valid, common
/// outcome, not an error.
///
/// Precedence: manifest dependencies, then an embedded runner config block,
/// then the `test` script command, then config files on disk.
pub fn detect_test_framework(root: &Path) -> Option<&'static str> {
    if let Some(manifest) = read_manifest(root) {
        let deps = dependency_names(&manifest);
        for rule in &TEST_FRAMEWORKS {
            if rule.packages.iter().any(|p| deps.iter().any(|d| d == p)) {
                return Some(rule.name);
            }
        }

        // Runner config block embedded in the manifest, e.g. a top-level
        // "jest" or "mocha" key.
        for rule in &TEST_FRAMEWORKS {
            if manifest.get(rule.name).is_some_and(Value::is_object) {
                return Some(rule.name);
            }
        }

        if let Some(script) = manifest
            .get("scripts")
            .and_then(|s| s.get("test"))
            .and_then(Value::as_str)
        {
            for rule in &TEST_FRAMEWORKS {
                if script.contains(rule.name) {
                    return Some(rule.name);
                }
            }
        }
    }

    for rule in &TEST_FRAMEWORKS {
        if rule.config_files.iter().any(|f| root.join(f).exists()) {
            return Some(rule.name);
        }
    }

    None
}

/// Classify a single path as a test file. Pure string inspection only.
///
/// Any basename containing `.test.` or `.spec.` (case-insensitive) is a test
/// file regardless of framework. Otherwise framework-specific rules apply
/// when a framework is known; with no framework, a file counts if its
/// basename or immediate parent directory is a conventional test name.
pub fn is_test_file(path: &Path, framework: Option<&str>) -> bool {
    let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = basename.to_ascii_lowercase();

    if lower.contains(".test.") || lower.contains(".spec.") {
        return true;
    }

    match framework {
        Some("jest") | Some("vitest") => {
            JS_TEST_SUFFIXES.iter().any(|s| lower.ends_with(s))
        }
        Some("pytest") => lower.ends_with(".py") && lower.contains("test"),
        Some("unittest") => lower.ends_with(".py") && lower.starts_with("test"),
        Some(_) => false,
        None => {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            if TEST_DIR_NAMES.contains(&stem.as_str()) {
                return true;
            }
            path.parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(|d| TEST_DIR_NAMES.contains(&d.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        }
    }
}

/// Classify the project's backend/frontend framework from its manifest, or
/// from single-file ecosystem markers when no manifest exists. A manifest
/// that matches nothing yields the generic `"node"`; no manifest and no
/// marker yields `None`.
pub fn detect_project_framework(root: &Path) -> Option<String> {
    if let Some(manifest) = read_manifest(root) {
        let deps = dependency_names(&manifest);
        for (package, name) in PROJECT_FRAMEWORKS {
            if deps.iter().any(|d| d == package) {
                return Some(name.to_string());
            }
        }
        return Some("node".to_string());
    }

    for (marker, name) in ECOSYSTEM_MARKERS {
        if root.join(marker).exists() {
            return Some(name.to_string());
        }
    }

    None
}
