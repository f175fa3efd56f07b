//! Project registry (`projects.json`) and data directory resolution.
//!
//! The registry maps a project name to its `FocalSurf` constants. It lives in
//! the data directory next to the tabulated files:
//!
//! ```text
//! Data_focal_planes/
//!   projects.json
//!   MUST.txt
//!   Spec-s5.txt
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::{DEFAULT_DATA_DIR, FocalSurf, ProjectRegistry};
use crate::error::AppError;

pub const REGISTRY_FILE: &str = "projects.json";

/// Environment variable overriding the default data directory.
pub const DATA_DIR_ENV: &str = "FOCAL_DATA_DIR";

/// Resolve the data directory: explicit flag, then `FOCAL_DATA_DIR`
/// (`.env` honoured), then `./Data_focal_planes`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    dotenvy::dotenv().ok();
    std::env::var(DATA_DIR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Load `projects.json` from the data directory.
pub fn load_registry(data_dir: &Path) -> Result<ProjectRegistry, AppError> {
    let path = data_dir.join(REGISTRY_FILE);
    let file = File::open(&path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open project registry '{}': {e}", path.display()),
        )
    })?;
    let registry: ProjectRegistry = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid project registry '{}': {e}", path.display())))?;
    validate_registry(&registry)?;
    Ok(registry)
}

/// Look up one project by name.
pub fn load_project(data_dir: &Path, name: &str) -> Result<FocalSurf, AppError> {
    let registry = load_registry(data_dir)?;
    registry.find(name).cloned().ok_or_else(|| {
        AppError::new(
            2,
            format!(
                "Unknown project '{name}'. Available: {}",
                registry.names().join(", ")
            ),
        )
    })
}

/// Path of the project's tabulated data file.
pub fn data_path(data_dir: &Path, surf: &FocalSurf) -> PathBuf {
    data_dir.join(surf.data_file_name())
}

fn validate_registry(registry: &ProjectRegistry) -> Result<(), AppError> {
    if registry.projects.is_empty() {
        return Err(AppError::new(2, "Project registry lists no projects."));
    }
    for p in &registry.projects {
        if p.name.trim().is_empty() {
            return Err(AppError::new(2, "Project registry entry with an empty name."));
        }
        if !(p.vig_r.is_finite() && p.vig_r > 0.0) {
            return Err(AppError::new(
                2,
                format!("Project '{}': vig_r must be finite and > 0 (got {}).", p.name, p.vig_r),
            ));
        }
        if let Some(bfs) = p.bfs {
            if !bfs.is_finite() || bfs == 0.0 {
                return Err(AppError::new(
                    2,
                    format!("Project '{}': bfs must be finite and non-zero.", p.name),
                ));
            }
        }
        if let Some(asph) = &p.asphere {
            let all_finite = asph.curvature.is_finite()
                && asph.conic.is_finite()
                && asph.coefficients.iter().all(|a| a.is_finite());
            if !all_finite {
                return Err(AppError::new(
                    2,
                    format!("Project '{}': asphere terms must be finite.", p.name),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("focal-surf-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_registry_and_finds_project_case_insensitively() {
        let dir = temp_dir("registry");
        std::fs::write(
            dir.join(REGISTRY_FILE),
            r#"{
                "projects": [
                    { "name": "MUST", "vig_r": 613.0, "bfs": 11067.0 },
                    { "name": "Spec-s5", "vig_r": 410.0, "data_file": "spec.csv",
                      "asphere": { "curvature": -0.0001, "conic": -1.0, "coefficients": [1e-12] } }
                ]
            }"#,
        )
        .unwrap();

        let must = load_project(&dir, "must").unwrap();
        assert_eq!(must.name, "MUST");
        assert_eq!(must.bfs, Some(11067.0));
        assert_eq!(data_path(&dir, &must), dir.join("MUST.txt"));
        assert!(!must.asph_formula());

        let spec = load_project(&dir, "Spec-s5").unwrap();
        assert!(spec.asph_formula());
        assert_eq!(data_path(&dir, &spec), dir.join("spec.csv"));

        let err = load_project(&dir, "MegaMapper").unwrap_err();
        assert!(err.to_string().contains("MUST, Spec-s5"));
    }

    #[test]
    fn rejects_non_positive_vignetting_radius() {
        let dir = temp_dir("bad-vig");
        std::fs::write(
            dir.join(REGISTRY_FILE),
            r#"{ "projects": [ { "name": "X", "vig_r": 0.0 } ] }"#,
        )
        .unwrap();
        assert_eq!(load_registry(&dir).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/somewhere");
        assert_eq!(resolve_data_dir(Some(&dir)), dir);
    }
}
